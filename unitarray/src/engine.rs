//! Unit arithmetic engine
//!
//! Pure decision logic: given the unit strings of two operands, work out
//! which operand has to be converted into which units before the numeric
//! operation runs, and which unit string the result carries. Nothing here
//! touches a buffer; [`crate::UnitArray`] applies the returned [`Plan`].
//!
//! Offset units (degC, degF) are affine, so only a few combinations are
//! meaningful:
//! - `a - b` where `a` is a single offset unit and `b` is compatible
//! - offset unit `+`/`-` its `delta_` difference unit
//! - multiplication when the registry auto-converts a lone offset unit
//!   to root units
//!
//! Everything else fails with [`UnitError::OffsetUnitCalculus`].

use tracing::{debug, trace};
use unitarray_units::{Converter, Decomposition, Dimension, Exponent, UnitError, UnitRegistry, DELTA_PREFIX};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddSub {
    Add,
    Sub,
}

impl AddSub {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            AddSub::Add => a + b,
            AddSub::Sub => a - b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulDiv {
    Mul,
    Div,
}

impl MulDiv {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            MulDiv::Mul => a * b,
            MulDiv::Div => a / b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn apply(self, a: f64, b: f64) -> bool {
        match self {
            CompareOp::Lt => a < b,
            CompareOp::Le => a <= b,
            CompareOp::Gt => a > b,
            CompareOp::Ge => a >= b,
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
        }
    }
}

/// Right-hand side of a binary operation as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rhs<'a> {
    /// Another unit-carrying operand with these units
    Units(&'a str),
    /// A plain number without units
    Scalar(f64),
}

/// Conversion of one operand's values before the numeric operation
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub to: Decomposition,
    pub converter: Converter,
}

/// What to do before and after a binary operation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    pub left: Option<Conversion>,
    pub right: Option<Conversion>,
    /// Unit string of the result
    pub units: String,
}

impl Plan {
    fn tagged(units: impl Into<String>) -> Self {
        Plan { left: None, right: None, units: units.into() }
    }
}

// Units of one operand with its offset components resolved once
struct Side<'a> {
    units: &'a str,
    decomposition: Decomposition,
    offset: Vec<String>,
}

impl<'a> Side<'a> {
    fn new(registry: &UnitRegistry, units: &'a str) -> Result<Self, UnitError> {
        let decomposition = registry.decompose(units)?;
        let offset = non_multiplicative_units(registry, &decomposition)?;
        Ok(Side { units, decomposition, offset })
    }

    /// The offset component when it is the only one and has exponent 1
    fn single_offset(&self) -> Option<&str> {
        match self.offset.as_slice() {
            [name] if self.decomposition.get(name) == Some(Exponent::from_integer(1)) => Some(name.as_str()),
            _ => None,
        }
    }

    fn rendered(&self) -> String {
        self.decomposition.to_string()
    }
}

/// Names of the offset units in a decomposition
pub fn non_multiplicative_units(registry: &UnitRegistry, units: &Decomposition) -> Result<Vec<String>, UnitError> {
    let mut offset = Vec::new();
    for name in units.names() {
        if !registry.is_multiplicative(name)? {
            offset.push(name.to_string());
        }
    }
    Ok(offset)
}

/// Names of the `delta_` units in a decomposition
pub fn delta_units(units: &Decomposition) -> Vec<String> {
    units.names()
        .filter(|name| name.starts_with(DELTA_PREFIX))
        .map(str::to_string)
        .collect()
}

/// Whether `units` carries a delta unit usable as a difference of
/// `offset_unit`: its own `delta_` form, or any delta unit with the same
/// reference units.
pub fn has_compatible_delta(registry: &UnitRegistry, units: &Decomposition, offset_unit: &str) -> Result<bool, UnitError> {
    let deltas = delta_units(units);
    let own = format!("{}{}", DELTA_PREFIX, offset_unit);
    if deltas.contains(&own) {
        return Ok(true);
    }
    let reference = registry.resolve(offset_unit)?.reference.clone();
    for delta in &deltas {
        if registry.resolve(delta)?.reference == reference {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether units may take part in multiplication or division.
///
/// Purely multiplicative units always may. A single offset unit with
/// exponent 1 and no other factor may only when the registry
/// auto-converts offset units to root units.
pub fn ok_for_mul_div(registry: &UnitRegistry, units: &Decomposition) -> Result<bool, UnitError> {
    let offset = non_multiplicative_units(registry, units)?;
    Ok(mul_div_safe(registry, units, &offset))
}

fn mul_div_safe(registry: &UnitRegistry, units: &Decomposition, offset: &[String]) -> bool {
    match offset {
        [] => true,
        [name] => {
            units.len() == 1
                && registry.options().autoconvert_offset_to_base_unit
                && units.get(name) == Some(Exponent::from_integer(1))
        }
        _ => false,
    }
}

pub fn is_dimensionless(registry: &UnitRegistry, units: &Decomposition) -> Result<bool, UnitError> {
    Ok(registry.dimensionality_of(units)?.is_dimensionless())
}

/// Conversion between two decompositions; `None` when they are equal
fn conversion(registry: &UnitRegistry, from: &Decomposition, to: &Decomposition) -> Result<Option<Conversion>, UnitError> {
    if from == to {
        return Ok(None);
    }
    let converter = registry.converter(from, to)?;
    Ok(Some(Conversion { to: to.clone(), converter }))
}

// Reduce a lone offset unit to its root units; other units pass through
fn root_if_offset(registry: &UnitRegistry, side: &Side) -> Result<(Option<Conversion>, Decomposition), UnitError> {
    if side.offset.len() == 1 && side.decomposition.len() == 1 {
        let (_, root) = registry.root_units(&side.decomposition)?;
        let conv = conversion(registry, &side.decomposition, &root)?;
        return Ok((conv, root));
    }
    Ok((None, side.decomposition.clone()))
}

fn dimensionality_error(registry: &UnitRegistry, left: &Side, right: &Side) -> Result<Error, UnitError> {
    Ok(UnitError::Dimensionality {
        from: left.rendered(),
        to: right.rendered(),
        from_dim: registry.dimensionality_of(&left.decomposition)?,
        to_dim: registry.dimensionality_of(&right.decomposition)?,
    }.into())
}

/// Plan `left + right` or `left - right`
pub fn plan_add_sub(registry: &UnitRegistry, op: AddSub, left: &str, right: Rhs) -> Result<Plan, Error> {
    let l = Side::new(registry, left)?;
    let right = match right {
        Rhs::Units(units) => units,
        Rhs::Scalar(value) => return plan_add_sub_scalar(registry, &l, value),
    };
    let r = Side::new(registry, right)?;

    if registry.dimensionality_of(&l.decomposition)? != registry.dimensionality_of(&r.decomposition)? {
        return Err(dimensionality_error(registry, &l, &r)?);
    }

    if l.offset.is_empty() && r.offset.is_empty() {
        let plan = if l.decomposition == r.decomposition {
            Plan::tagged(left)
        } else if !delta_units(&l.decomposition).is_empty() && delta_units(&r.decomposition).is_empty() {
            // a difference combined with a plain quantity takes the plain units
            Plan {
                left: conversion(registry, &l.decomposition, &r.decomposition)?,
                right: None,
                units: right.to_string(),
            }
        } else {
            Plan {
                left: None,
                right: conversion(registry, &r.decomposition, &l.decomposition)?,
                units: left.to_string(),
            }
        };
        debug!(rule = "multiplicative", ?op, left, right, units = %plan.units, "add/sub plan");
        return Ok(plan);
    }

    let l_single = l.single_offset();
    let r_single = r.single_offset();
    let l_has_delta = match l_single {
        Some(name) => has_compatible_delta(registry, &r.decomposition, name)?,
        None => false,
    };
    let r_has_delta = match r_single {
        Some(name) => has_compatible_delta(registry, &l.decomposition, name)?,
        None => false,
    };
    let subtracting = op == AddSub::Sub;

    let plan = if subtracting && ((l_single.is_some() && !l_has_delta) || (r_single.is_some() && !r_has_delta)) {
        debug!(rule = "offset difference", left, right, "add/sub plan");
        Plan {
            left: None,
            right: conversion(registry, &r.decomposition, &l.decomposition)?,
            units: left.to_string(),
        }
    } else if let (Some(name), true) = (l_single, l_has_delta) {
        let to = l.decomposition.rename(name, &format!("{}{}", DELTA_PREFIX, name))?;
        debug!(rule = "offset with delta", ?op, left, right, to = %to, "add/sub plan");
        Plan {
            left: None,
            right: conversion(registry, &r.decomposition, &to)?,
            units: left.to_string(),
        }
    } else if let (Some(name), true) = (r_single, r_has_delta) {
        let to = r.decomposition.rename(name, &format!("{}{}", DELTA_PREFIX, name))?;
        debug!(rule = "delta with offset", ?op, left, right, to = %to, "add/sub plan");
        Plan {
            left: conversion(registry, &l.decomposition, &to)?,
            right: None,
            units: right.to_string(),
        }
    } else {
        return Err(UnitError::offset(l.rendered(), r.rendered()).into());
    };
    Ok(plan)
}

fn plan_add_sub_scalar(registry: &UnitRegistry, left: &Side, value: f64) -> Result<Plan, Error> {
    if value == 0.0 {
        debug!(rule = "zero", left = left.units, "add/sub plan");
        return Ok(Plan::tagged(""));
    }
    if is_dimensionless(registry, &left.decomposition)? {
        debug!(rule = "dimensionless", left = left.units, "add/sub plan");
        return Ok(Plan {
            left: conversion(registry, &left.decomposition, &Decomposition::new())?,
            right: None,
            units: String::new(),
        });
    }
    Err(UnitError::Dimensionality {
        from: left.rendered(),
        to: "dimensionless".to_string(),
        from_dim: registry.dimensionality_of(&left.decomposition)?,
        to_dim: Dimension::dimensionless(),
    }.into())
}

/// Plan `left * right` or `left / right`
pub fn plan_mul_div(registry: &UnitRegistry, op: MulDiv, left: &str, right: Rhs) -> Result<Plan, Error> {
    let l = Side::new(registry, left)?;

    let right = match right {
        Rhs::Units(units) => units,
        Rhs::Scalar(_) => {
            let safe = mul_div_safe(registry, &l.decomposition, &l.offset);
            if !safe || (op == MulDiv::Div && !l.offset.is_empty()) {
                return Err(UnitError::offset(l.rendered(), "").into());
            }
            if l.offset.is_empty() {
                return Ok(Plan::tagged(left));
            }
            let (conv, root) = root_if_offset(registry, &l)?;
            trace!(?op, left, units = %root, "mul/div by scalar in root units");
            return Ok(Plan { left: conv, right: None, units: root.to_string() });
        }
    };
    let r = Side::new(registry, right)?;

    if !mul_div_safe(registry, &l.decomposition, &l.offset) || !mul_div_safe(registry, &r.decomposition, &r.offset) {
        return Err(UnitError::offset(l.rendered(), r.rendered()).into());
    }

    let (left_conv, l_units) = root_if_offset(registry, &l)?;
    let (right_conv, r_units) = root_if_offset(registry, &r)?;
    let units = match op {
        MulDiv::Mul => l_units.multiply(&r_units)?,
        MulDiv::Div => l_units.divide(&r_units)?,
    };
    trace!(?op, left, right, units = %units, "mul/div plan");
    Ok(Plan { left: left_conv, right: right_conv, units: units.to_string() })
}

/// Plan an elementwise comparison. Same units compare directly, equal
/// dimensionality compares in root units.
pub fn plan_compare(registry: &UnitRegistry, left: &str, right: Rhs) -> Result<Plan, Error> {
    let l = Side::new(registry, left)?;

    let right = match right {
        Rhs::Units(units) => units,
        Rhs::Scalar(_) => {
            if !is_dimensionless(registry, &l.decomposition)? {
                return Err(Error::Type(format!(
                    "cannot compare array in '{}' with a plain number", left
                )));
            }
            return Ok(Plan {
                left: conversion(registry, &l.decomposition, &Decomposition::new())?,
                right: None,
                units: String::new(),
            });
        }
    };
    let r = Side::new(registry, right)?;

    if l.decomposition == r.decomposition {
        return Ok(Plan::tagged(left));
    }
    if registry.dimensionality_of(&l.decomposition)? != registry.dimensionality_of(&r.decomposition)? {
        return Err(dimensionality_error(registry, &l, &r)?);
    }

    let (_, l_root) = registry.root_units(&l.decomposition)?;
    let (_, r_root) = registry.root_units(&r.decomposition)?;
    Ok(Plan {
        left: conversion(registry, &l.decomposition, &l_root)?,
        right: conversion(registry, &r.decomposition, &r_root)?,
        units: l_root.to_string(),
    })
}

/// Plan an explicit conversion. `None` when the units already match.
///
/// An unparseable target or a dimensionality mismatch is reported as
/// [`Error::InvalidUnits`]; failures of the source units propagate as is.
pub fn plan_conversion(registry: &UnitRegistry, from: &str, to: &str) -> Result<Option<Conversion>, Error> {
    let invalid = |err: UnitError| Error::InvalidUnits { units: to.to_string(), message: err.to_string() };

    let from_units = registry.decompose(from)?;
    let to_units = registry.decompose(to).map_err(invalid)?;
    conversion(registry, &from_units, &to_units).map_err(|err| match err {
        UnitError::Dimensionality { .. } => invalid(err),
        other => other.into(),
    })
}
