//! Unit-carrying labeled arrays

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;
use ndarray::ArrayD;
use tracing::trace;
use unitarray_core::LabeledArray;
use unitarray_units::{Decomposition, Dimension, UnitRegistry};
use crate::engine::{self, AddSub, CompareOp, Conversion, MulDiv, Plan, Rhs};
use crate::Error;

/// Right-hand operand of a binary operation
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Array(&'a UnitArray),
    /// Plain number without units
    Scalar(f64),
    /// Bare unit literal, a unit-valued 1
    Units(&'a str),
}

impl<'a> From<&'a UnitArray> for Operand<'a> {
    fn from(array: &'a UnitArray) -> Self {
        Operand::Array(array)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl<'a> From<&'a str> for Operand<'a> {
    fn from(units: &'a str) -> Self {
        Operand::Units(units)
    }
}

/// A labeled array whose `units` attribute drives every operation.
///
/// Arithmetic asks [`engine`] for a plan, converts operands as planned,
/// runs the elementwise operation on the labeled arrays and stamps the
/// planned units on the result. Copying operations never modify either
/// operand; in-place operations leave the receiver untouched on error.
#[derive(Debug, Clone)]
pub struct UnitArray {
    inner: LabeledArray,
    registry: Arc<UnitRegistry>,
}

impl UnitArray {
    /// Tag values with units, using the shared registry
    pub fn quantity(values: impl Into<LabeledArray>, units: impl Into<String>) -> Self {
        Self::with_registry(UnitRegistry::default_shared(), values, units)
    }

    pub fn with_registry(registry: Arc<UnitRegistry>, values: impl Into<LabeledArray>, units: impl Into<String>) -> Self {
        let mut inner = values.into();
        inner.attrs_mut().set_units(units);
        UnitArray { inner, registry }
    }

    /// Wrap an existing labeled array as is; missing units surface on first use
    pub fn from_labeled(registry: Arc<UnitRegistry>, inner: LabeledArray) -> Self {
        UnitArray { inner, registry }
    }

    /// 0-d array from a quantity string such as "5 km" or "20 %"
    pub fn parse(registry: Arc<UnitRegistry>, input: &str) -> Result<Self, Error> {
        let (value, units) = registry.parse_quantity(input)?;
        Ok(Self::with_registry(registry, value, units))
    }

    fn wrap(&self, inner: LabeledArray) -> UnitArray {
        UnitArray { inner, registry: Arc::clone(&self.registry) }
    }

    // ========== Inspection ==========

    pub fn units(&self) -> Result<&str, Error> {
        self.inner.attrs().units().ok_or(Error::MissingUnits)
    }

    /// The raw values, without units
    pub fn magnitude(&self) -> &ArrayD<f64> {
        self.inner.values()
    }

    pub fn m(&self) -> &ArrayD<f64> {
        self.magnitude()
    }

    pub fn labeled(&self) -> &LabeledArray {
        &self.inner
    }

    pub fn into_labeled(self) -> LabeledArray {
        self.inner
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    pub fn decomposition(&self) -> Result<Decomposition, Error> {
        Ok(self.registry.decompose(self.units()?)?)
    }

    pub fn dimensionality(&self) -> Result<Dimension, Error> {
        Ok(self.registry.get_dimensionality(self.units()?)?)
    }

    pub fn dimensionless(&self) -> Result<bool, Error> {
        Ok(engine::is_dimensionless(&self.registry, &self.decomposition()?)?)
    }

    /// Registered units this array could be converted to
    pub fn compatible_units(&self) -> Result<BTreeSet<String>, Error> {
        Ok(self.registry.compatible_units(&self.decomposition()?)?)
    }

    pub fn delta_units(&self) -> Result<Vec<String>, Error> {
        Ok(engine::delta_units(&self.decomposition()?))
    }

    pub fn non_multiplicative_units(&self) -> Result<Vec<String>, Error> {
        Ok(engine::non_multiplicative_units(&self.registry, &self.decomposition()?)?)
    }

    // ========== Arithmetic ==========

    pub fn add<'o>(&self, other: impl Into<Operand<'o>>) -> Result<UnitArray, Error> {
        self.add_sub(AddSub::Add, other.into())
    }

    pub fn sub<'o>(&self, other: impl Into<Operand<'o>>) -> Result<UnitArray, Error> {
        self.add_sub(AddSub::Sub, other.into())
    }

    /// `other - self`, computed as `-(self - other)`
    pub fn rsub<'o>(&self, other: impl Into<Operand<'o>>) -> Result<UnitArray, Error> {
        Ok(self.sub(other)?.neg())
    }

    pub fn mul<'o>(&self, other: impl Into<Operand<'o>>) -> Result<UnitArray, Error> {
        self.mul_div(MulDiv::Mul, other.into())
    }

    pub fn div<'o>(&self, other: impl Into<Operand<'o>>) -> Result<UnitArray, Error> {
        self.mul_div(MulDiv::Div, other.into())
    }

    /// `numerator / self`
    pub fn rdiv(&self, numerator: f64) -> Result<UnitArray, Error> {
        let plan = engine::plan_mul_div(&self.registry, MulDiv::Div, "", Rhs::Units(self.units()?))?;
        let values = converted(&self.inner, &plan.right);
        let mut inner = values.map(|v| numerator / v);
        inner.attrs_mut().set_units(plan.units);
        Ok(self.wrap(inner))
    }

    pub fn neg(&self) -> UnitArray {
        self.wrap(self.inner.map(|v| -v))
    }

    pub fn iadd<'o>(&mut self, other: impl Into<Operand<'o>>) -> Result<&mut Self, Error> {
        self.add_sub_inplace(AddSub::Add, other.into())
    }

    pub fn isub<'o>(&mut self, other: impl Into<Operand<'o>>) -> Result<&mut Self, Error> {
        self.add_sub_inplace(AddSub::Sub, other.into())
    }

    pub fn imul<'o>(&mut self, other: impl Into<Operand<'o>>) -> Result<&mut Self, Error> {
        self.mul_div_inplace(MulDiv::Mul, other.into())
    }

    pub fn idiv<'o>(&mut self, other: impl Into<Operand<'o>>) -> Result<&mut Self, Error> {
        self.mul_div_inplace(MulDiv::Div, other.into())
    }

    fn add_sub(&self, op: AddSub, other: Operand) -> Result<UnitArray, Error> {
        let (rhs, values) = resolve(other)?;
        let plan = engine::plan_add_sub(&self.registry, op, self.units()?, rhs)?;
        self.apply(plan, &values, |a, b| op.apply(a, b))
    }

    fn mul_div(&self, op: MulDiv, other: Operand) -> Result<UnitArray, Error> {
        let (rhs, values) = resolve(other)?;
        let plan = engine::plan_mul_div(&self.registry, op, self.units()?, rhs)?;
        self.apply(plan, &values, |a, b| op.apply(a, b))
    }

    fn add_sub_inplace(&mut self, op: AddSub, other: Operand) -> Result<&mut Self, Error> {
        let (rhs, values) = resolve(other)?;
        let plan = engine::plan_add_sub(&self.registry, op, self.units()?, rhs)?;
        self.apply_inplace(plan, &values, |a, b| op.apply(a, b))?;
        Ok(self)
    }

    fn mul_div_inplace(&mut self, op: MulDiv, other: Operand) -> Result<&mut Self, Error> {
        let (rhs, values) = resolve(other)?;
        let plan = engine::plan_mul_div(&self.registry, op, self.units()?, rhs)?;
        self.apply_inplace(plan, &values, |a, b| op.apply(a, b))?;
        Ok(self)
    }

    fn apply(&self, plan: Plan, other: &LabeledArray, f: impl Fn(f64, f64) -> f64) -> Result<UnitArray, Error> {
        let left = converted(&self.inner, &plan.left);
        let right = converted(other, &plan.right);
        let mut inner = left.zip_with(&right, f)?;
        inner.attrs_mut().set_units(plan.units);
        Ok(self.wrap(inner))
    }

    fn apply_inplace(&mut self, plan: Plan, other: &LabeledArray, f: impl Fn(f64, f64) -> f64) -> Result<(), Error> {
        let right = converted(other, &plan.right);
        self.inner.check_inplace(&right)?;

        if let Some(conv) = plan.left {
            let converter = conv.converter;
            self.inner.map_inplace(move |v| converter.apply(v));
        }
        self.inner.zip_with_inplace(&right, f)?;
        self.inner.attrs_mut().set_units(plan.units);
        Ok(())
    }

    // ========== Comparison ==========

    /// Elementwise comparison. Same units compare directly; equal
    /// dimensionality compares in root units; plain numbers only compare
    /// with dimensionless arrays.
    pub fn compare<'o>(&self, other: impl Into<Operand<'o>>, op: CompareOp) -> Result<ArrayD<bool>, Error> {
        let (rhs, values) = resolve(other.into())?;
        let plan = engine::plan_compare(&self.registry, self.units()?, rhs)?;
        let left = converted(&self.inner, &plan.left);
        let right = converted(&values, &plan.right);
        Ok(left.compare_with(&right, |a, b| op.apply(a, b))?)
    }

    pub fn lt<'o>(&self, other: impl Into<Operand<'o>>) -> Result<ArrayD<bool>, Error> {
        self.compare(other, CompareOp::Lt)
    }

    pub fn le<'o>(&self, other: impl Into<Operand<'o>>) -> Result<ArrayD<bool>, Error> {
        self.compare(other, CompareOp::Le)
    }

    pub fn gt<'o>(&self, other: impl Into<Operand<'o>>) -> Result<ArrayD<bool>, Error> {
        self.compare(other, CompareOp::Gt)
    }

    pub fn ge<'o>(&self, other: impl Into<Operand<'o>>) -> Result<ArrayD<bool>, Error> {
        self.compare(other, CompareOp::Ge)
    }

    pub fn eq<'o>(&self, other: impl Into<Operand<'o>>) -> Result<ArrayD<bool>, Error> {
        self.compare(other, CompareOp::Eq)
    }

    pub fn ne<'o>(&self, other: impl Into<Operand<'o>>) -> Result<ArrayD<bool>, Error> {
        self.compare(other, CompareOp::Ne)
    }

    // ========== Conversion ==========

    /// Copy converted to `units`
    pub fn to(&self, units: &str) -> Result<UnitArray, Error> {
        let mut out = self.clone();
        out.ito(units)?;
        Ok(out)
    }

    /// Convert in place. No-op when the units already match.
    pub fn ito(&mut self, units: &str) -> Result<&mut Self, Error> {
        let from = self.units()?;
        if let Some(conv) = engine::plan_conversion(&self.registry, from, units)? {
            trace!(from, to = units, "converting array");
            let converter = conv.converter;
            self.inner.map_inplace(move |v| converter.apply(v));
            self.inner.attrs_mut().set_units(units);
        }
        Ok(self)
    }

    pub fn to_root_units(&self) -> Result<UnitArray, Error> {
        let (_, root) = self.registry.root_units(&self.decomposition()?)?;
        self.to(&root.to_string())
    }

    pub fn ito_root_units(&mut self) -> Result<&mut Self, Error> {
        let (_, root) = self.registry.root_units(&self.decomposition()?)?;
        self.ito(&root.to_string())
    }

    pub fn to_base_units(&self) -> Result<UnitArray, Error> {
        let (_, base) = self.registry.base_units(&self.decomposition()?)?;
        self.to(&base.to_string())
    }

    pub fn ito_base_units(&mut self) -> Result<&mut Self, Error> {
        let (_, base) = self.registry.base_units(&self.decomposition()?)?;
        self.ito(&base.to_string())
    }
}

// Units and values of the right operand
fn resolve(other: Operand<'_>) -> Result<(Rhs<'_>, Cow<'_, LabeledArray>), Error> {
    Ok(match other {
        Operand::Array(array) => (Rhs::Units(array.units()?), Cow::Borrowed(&array.inner)),
        Operand::Scalar(value) => (Rhs::Scalar(value), Cow::Owned(LabeledArray::scalar(value))),
        Operand::Units(units) => (Rhs::Units(units), Cow::Owned(LabeledArray::scalar(1.0))),
    })
}

fn converted<'a>(values: &'a LabeledArray, conversion: &Option<Conversion>) -> Cow<'a, LabeledArray> {
    match conversion {
        Some(conv) => {
            let converter = conv.converter;
            Cow::Owned(values.map(move |v| converter.apply(v)))
        }
        None => Cow::Borrowed(values),
    }
}
