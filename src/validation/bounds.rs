//! Range checks for the parametric model families.

use crate::{
    action::{BridgeEndplay, Castles, Drones, SimpleVoting, TianJi},
    config::{BoundsConfig, FamilyBounds, above_max, below_min},
    error::StructuredError,
};

/// One named integer parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Wire name of the parameter.
    pub name: &'static str,
    /// Parameter value.
    pub value: i64,
}

const fn field(name: &'static str, value: i64) -> Field { Field { name, value } }

/// A parameter set whose fields are range-checked against [`BoundsConfig`].
pub trait Parametric: Sized {
    /// Fields in declaration order.
    fn fields(&self) -> Vec<Field>;

    /// The bounds configured for this family.
    fn bounds(config: &BoundsConfig) -> &FamilyBounds<Self>;
}

impl Parametric for BridgeEndplay {
    fn fields(&self) -> Vec<Field> {
        vec![
            field("deckSize", self.deck_size),
            field("cardsInHand", self.cards_in_hand),
        ]
    }

    fn bounds(config: &BoundsConfig) -> &FamilyBounds<Self> { &config.bridge_endplay }
}

impl Parametric for Castles {
    fn fields(&self) -> Vec<Field> {
        vec![
            field("castle1Size", self.castle1_size),
            field("castle2Size", self.castle2_size),
            field("castle3Size", self.castle3_size),
            field("life", self.life),
        ]
    }

    fn bounds(config: &BoundsConfig) -> &FamilyBounds<Self> { &config.castles }
}

impl Parametric for Drones {
    fn fields(&self) -> Vec<Field> {
        vec![
            field("numberOfDrones", self.number_of_drones),
            field("initialEnergy", self.initial_energy),
        ]
    }

    fn bounds(config: &BoundsConfig) -> &FamilyBounds<Self> { &config.drones }
}

impl Parametric for SimpleVoting {
    fn fields(&self) -> Vec<Field> {
        vec![
            field("voters", self.voters),
            field("candidates", self.candidates),
        ]
    }

    fn bounds(config: &BoundsConfig) -> &FamilyBounds<Self> { &config.simple_voting }
}

impl Parametric for TianJi {
    fn fields(&self) -> Vec<Field> { vec![field("horses", self.horses)] }

    fn bounds(config: &BoundsConfig) -> &FamilyBounds<Self> { &config.tian_ji }
}

/// Check every field of `params` against its family bounds.
///
/// Fields are checked in declaration order and the first violation is
/// returned.
///
/// # Errors
///
/// Returns [`StructuredError::ParameterRange`] carrying the violated field and
/// both configured bounds.
pub fn check_bounds<P: Parametric>(params: &P, config: &BoundsConfig) -> Result<(), StructuredError> {
    let bounds = P::bounds(config);
    let mins = bounds.min.fields();
    let maxs = bounds.max.fields();
    for ((value, min), max) in params.fields().into_iter().zip(mins).zip(maxs) {
        check_field(value, min.value, max.value)?;
    }
    Ok(())
}

fn check_field(field: Field, min: i64, max: i64) -> Result<(), StructuredError> {
    if below_min(field.value, min) || above_max(field.value, max) {
        return Err(StructuredError::ParameterRange {
            parameter_name: field.name.to_owned(),
            value: field.value,
            min,
            max,
        });
    }
    Ok(())
}
