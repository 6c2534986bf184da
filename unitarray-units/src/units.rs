//! Unit registry: definitions, name resolution and conversion

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock};
use ndarray::{Array, ArrayBase, Data, DataMut, Dimension as NdDimension};
use num_traits::One;
use tracing::{debug, trace, warn};
use crate::definition::{Definition, DefinitionValue, PrefixDefinition, UnitDefinition};
use crate::parse::{is_bare_identifier, parse_expression, parse_quantity_string, pow_scale, Parsed};
use crate::unit::{Converter, Prefix, Unit};
use crate::{Decomposition, Dimension, Exponent, RegistryOptions, UnitError};

/// Built-in units, ~100 spellings organized by category
pub const DEFAULT_DEFINITIONS: &str = r#"
# Prefixes
pico- = 1e-12 = p-
nano- = 1e-9 = n-
micro- = 1e-6 = u- = µ-
milli- = 1e-3 = m-
centi- = 1e-2 = c-
deci- = 1e-1 = d-
deca- = 1e1 = da- = deka-
hecto- = 1e2 = h-
kilo- = 1e3 = k-
mega- = 1e6 = M-
giga- = 1e9 = G-
tera- = 1e12 = T-

# Root units
meter = [length] = m = metre
gram = [mass] = g
second = [time] = s = sec
ampere = [current] = A = amp
kelvin = [temperature] = K = degK
mole = [substance] = mol
candela = [luminosity] = cd
radian = [] = rad
count = []

# Length
inch = 0.0254 * meter = in
foot = 12 * inch = ft = feet
yard = 3 * foot = yd
mile = 1760 * yard = mi
nautical_mile = 1852 * meter = nmi
angstrom = 1e-10 * meter = Å
astronomical_unit = 149597870700 * meter = au
light_year = 9460730472580800 * meter = ly
parsec = 30856775814913673 * meter = pc

# Mass
tonne = 1000 * kilogram = t = metric_ton
pound = 0.45359237 * kilogram = lb
ounce = pound / 16 = oz

# Time
minute = 60 * second = min
hour = 60 * minute = h = hr
day = 24 * hour = d
week = 7 * day
year = 365.25 * day = yr = julian_year

# Temperature
degree_Celsius = kelvin; offset: 273.15 = degC = celsius = degreeC
degree_Fahrenheit = 5 / 9 * kelvin; offset: 255.37222222222223 = degF = fahrenheit = degreeF
degree_Rankine = 5 / 9 * kelvin = degR = rankine = degreeR

# Area and volume
hectare = 10000 * meter ** 2 = ha
liter = decimeter ** 3 = l = L = litre

# Mechanics
hertz = 1 / second = Hz
newton = kilogram * meter / second ** 2 = N
joule = newton * meter = J
watt = joule / second = W
pascal = newton / meter ** 2 = Pa
bar = 1e5 * pascal
atmosphere = 101325 * pascal = atm
calorie = 4.184 * joule = cal
knot = nautical_mile / hour = kt

# Electromagnetism
coulomb = ampere * second = C
volt = watt / ampere = V
ohm = volt / ampere = Ω

# Angle
degree = 0.017453292519943295 * radian = deg = arcdeg
arcminute = degree / 60 = arcmin
arcsecond = arcminute / 60 = arcsec
turn = 6.283185307179586 * radian = revolution
"#;

/// Unit families installed on top of the defaults
pub const CUSTOM_DEFINITIONS: [&str; 3] = [
    "degrees_north = degree_north = degree_N = degrees_N = degreeN = degreesN",
    "degrees_east = degree_east = degree_E = degrees_E = degreeE = degreesE",
    "percent = 0.01 * count",
];

/// Root unit -> base unit substitutions (root name, base name, root per base)
const BASE_SYSTEM: [(&str, &str, f64); 1] = [("gram", "kilogram", 1e3)];

static SHARED: LazyLock<Arc<UnitRegistry>> =
    LazyLock::new(|| Arc::new(UnitRegistry::new(RegistryOptions::from_env())));

/// Replace symbols the expression grammar cannot read: `%` -> `percent`,
/// `°` -> `degree`. Idempotent.
pub fn normalize(unit_string: &str) -> String {
    unit_string.replace('%', "percent").replace('°', "degree")
}

/// Registry of all known units
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: HashMap<String, Unit>,
    /// Every spelling (name, symbol, alias) -> canonical name
    lookup: HashMap<String, String>,
    prefixes: Vec<Prefix>,
    options: RegistryOptions,
}

impl UnitRegistry {
    /// Registry with the built-in and custom unit families
    ///
    /// # Panics
    ///
    /// Only if the compiled-in definitions fail to load, which
    /// `test_builtin_definitions_load` rules out. Use [`UnitRegistry::try_new`]
    /// to handle the error instead.
    pub fn new(options: RegistryOptions) -> Self {
        Self::try_new(options).expect("built-in unit definitions are valid")
    }

    pub fn try_new(options: RegistryOptions) -> Result<Self, UnitError> {
        let mut registry = Self::empty(options);
        registry.load_definitions(DEFAULT_DEFINITIONS)?;
        for definition in CUSTOM_DEFINITIONS {
            registry.define(definition)?;
        }
        debug!(
            units = registry.units.len(),
            prefixes = registry.prefixes.len(),
            autoconvert = options.autoconvert_offset_to_base_unit,
            "unit registry initialized"
        );
        Ok(registry)
    }

    /// Registry with no units at all
    pub fn empty(options: RegistryOptions) -> Self {
        UnitRegistry {
            units: HashMap::new(),
            lookup: HashMap::new(),
            prefixes: Vec::new(),
            options,
        }
    }

    /// The process-wide registry, built once on first use
    pub fn default_shared() -> Arc<UnitRegistry> {
        Arc::clone(&SHARED)
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Number of registered units (delta units included, prefixed forms not)
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    // ========== Definitions ==========

    /// Load a block of definition lines
    pub fn load_definitions(&mut self, text: &str) -> Result<(), UnitError> {
        for line in text.lines() {
            self.define(line)?;
        }
        Ok(())
    }

    /// Add a single definition, e.g. `percent = 0.01 * count`
    pub fn define(&mut self, line: &str) -> Result<(), UnitError> {
        match Definition::parse(line)? {
            None => Ok(()),
            Some(Definition::Prefix(def)) => {
                self.define_prefix(def);
                Ok(())
            }
            Some(Definition::Unit(def)) => self.define_unit(def),
        }
    }

    fn define_prefix(&mut self, def: PrefixDefinition) {
        self.prefixes.retain(|p| p.name != def.name);
        self.prefixes.push(Prefix {
            name: def.name,
            symbol: def.symbol,
            aliases: def.aliases,
            factor: def.factor,
        });
    }

    fn define_unit(&mut self, def: UnitDefinition) -> Result<(), UnitError> {
        let mut aliases = def.aliases;
        let mut unit = match def.value {
            DefinitionValue::Root(dimension) => Unit {
                offset: def.offset,
                ..Unit::root(&def.name, dimension)
            },
            DefinitionValue::Expression(expr) => match self.parse_raw(&expr) {
                Ok((scale, units)) => self.derived_unit(&def.name, scale, &units, def.offset)?,
                // A value naming an unknown unit makes a new dimensionless
                // root, and the value spelling becomes one more alias.
                Err(UnitError::UndefinedUnit(_)) if is_bare_identifier(&expr) => {
                    debug!(name = %def.name, alias = %expr, "defining dimensionless root unit");
                    aliases.insert(0, expr);
                    Unit {
                        offset: def.offset,
                        ..Unit::root(&def.name, Dimension::dimensionless())
                    }
                }
                Err(e) => return Err(e),
            },
        };
        unit.symbol = def.symbol;
        unit.aliases = aliases;

        let delta = (!unit.is_multiplicative()).then(|| unit.delta());
        self.register(unit);
        if let Some(delta) = delta {
            self.register(delta);
        }
        Ok(())
    }

    // `name = scale * units; offset: offset`, with `offset` in the units of
    // the reference. A reference to an offset unit must be that unit alone
    // with exponent 1, and its own offset carries over.
    fn derived_unit(&self, name: &str, scale: f64, units: &Decomposition, offset: f64) -> Result<Unit, UnitError> {
        let (root_scale, reference, root_offset) = match self.offset_units(units)?.as_slice() {
            [] => {
                let (root_scale, reference) = self.root_units(units)?;
                (root_scale, reference, 0.0)
            }
            [(unit, exp)] if units.len() == 1 && exp.is_one() => {
                (unit.factor, unit.reference.clone(), unit.offset)
            }
            _ => {
                return Err(UnitError::definition(
                    name,
                    format!("offset unit in compound reference '{}'", units),
                ))
            }
        };

        Ok(Unit {
            name: name.to_string(),
            symbol: None,
            aliases: Vec::new(),
            dimension: self.dimensionality_of(&reference)?,
            reference,
            factor: scale * root_scale,
            offset: root_offset + offset * root_scale,
        })
    }

    fn register(&mut self, unit: Unit) {
        if self.units.contains_key(&unit.name) {
            warn!(name = %unit.name, "redefining unit");
        }
        for spelling in unit.spellings() {
            self.lookup.insert(spelling.to_string(), unit.name.clone());
        }
        self.units.insert(unit.name.clone(), unit);
    }

    // ========== Name resolution ==========

    fn lookup_exact(&self, name: &str) -> Option<&Unit> {
        self.lookup.get(name).and_then(|canonical| self.units.get(canonical))
    }

    fn lookup_singular(&self, name: &str) -> Option<&Unit> {
        self.lookup_exact(name).or_else(|| {
            name.strip_suffix('s')
                .filter(|s| !s.is_empty())
                .and_then(|s| self.lookup_exact(s))
        })
    }

    /// Resolve any spelling to its unit, first match wins:
    /// 1. exact name, symbol or alias
    /// 2. SI prefix + exact unit ("ms" is millisecond)
    /// 3. plural of a unit ("mins" is minute, not milli-inch)
    /// 4. SI prefix + plural unit ("kilometers")
    ///
    /// Prefixes never apply to offset or delta units.
    pub fn resolve(&self, name: &str) -> Result<Cow<'_, Unit>, UnitError> {
        if let Some(unit) = self.lookup_exact(name) {
            return Ok(Cow::Borrowed(unit));
        }
        if let Some(unit) = self.lookup_prefixed(name, move |rest| self.lookup_exact(rest)) {
            return Ok(Cow::Owned(unit));
        }
        if let Some(unit) = self.lookup_singular(name) {
            return Ok(Cow::Borrowed(unit));
        }
        if let Some(unit) = self.lookup_prefixed(name, move |rest| self.lookup_singular(rest)) {
            return Ok(Cow::Owned(unit));
        }
        Err(UnitError::UndefinedUnit(name.to_string()))
    }

    // Longest matching prefix first
    fn lookup_prefixed<'a, F>(&'a self, name: &str, lookup: F) -> Option<Unit>
    where
        F: Fn(&str) -> Option<&'a Unit>,
    {
        let mut candidates: Vec<(&str, &Prefix)> = self.prefixes
            .iter()
            .flat_map(|p| p.spellings().map(move |s| (s, p)))
            .collect();
        candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        for (spelling, prefix) in candidates {
            let Some(rest) = name.strip_prefix(spelling) else { continue };
            if rest.is_empty() {
                continue;
            }
            if let Some(unit) = lookup(rest) {
                if unit.is_multiplicative() && !unit.is_delta() {
                    return Some(Unit {
                        name: format!("{}{}", prefix.name, unit.name),
                        symbol: match (&prefix.symbol, &unit.symbol) {
                            (Some(p), Some(u)) => Some(format!("{}{}", p, u)),
                            _ => None,
                        },
                        aliases: Vec::new(),
                        dimension: unit.dimension,
                        reference: unit.reference.clone(),
                        factor: prefix.factor * unit.factor,
                        offset: 0.0,
                    });
                }
            }
        }
        None
    }

    /// Canonical name of any spelling (e.g. "km" -> "kilometer")
    pub fn canonical_name(&self, name: &str) -> Result<String, UnitError> {
        self.resolve(name).map(|u| u.name.clone())
    }

    // ========== Parsing ==========

    fn parse_raw(&self, input: &str) -> Result<Parsed, UnitError> {
        parse_expression(input, |name| self.canonical_name(name))
    }

    /// Normalize then parse, keeping any numeric scale
    pub fn parse_units(&self, unit_string: &str) -> Result<Parsed, UnitError> {
        self.parse_raw(&normalize(unit_string))
    }

    /// True iff the string normalizes and parses to known units
    pub fn is_valid(&self, unit_string: &str) -> bool {
        self.parse_units(unit_string).is_ok()
    }

    /// Canonical decomposition of a unit string. Unit strings carry no
    /// numeric factor; `"0.01 * count"` is rejected.
    pub fn decompose(&self, unit_string: &str) -> Result<Decomposition, UnitError> {
        let (scale, units) = self.parse_units(unit_string)?;
        if scale != 1.0 {
            return Err(UnitError::parse(unit_string, format!("unit carries a numeric factor {}", scale)));
        }
        Ok(units)
    }

    /// Split a quantity string like "5 km" into magnitude and canonical unit
    pub fn parse_quantity(&self, input: &str) -> Result<(f64, String), UnitError> {
        let normalized = normalize(input);
        let (value, unit_text) = parse_quantity_string(&normalized)?;
        let (scale, units) = self.parse_raw(unit_text)?;
        Ok((value * scale, units.to_string()))
    }

    // ========== Queries ==========

    pub fn get_dimensionality(&self, unit_string: &str) -> Result<Dimension, UnitError> {
        self.dimensionality_of(&self.decompose(unit_string)?)
    }

    pub fn dimensionality_of(&self, units: &Decomposition) -> Result<Dimension, UnitError> {
        let mut dim = Dimension::dimensionless();
        for (name, exp) in units.iter() {
            dim = dim.multiply(&self.resolve(name)?.dimension.power(exp)?)?;
        }
        Ok(dim)
    }

    /// False for offset units (Celsius, Fahrenheit)
    pub fn is_multiplicative(&self, name: &str) -> Result<bool, UnitError> {
        self.resolve(name).map(|u| u.is_multiplicative())
    }

    /// Reduce to root units: `1 <units> = scale <root>`
    pub fn root_units(&self, units: &Decomposition) -> Result<(f64, Decomposition), UnitError> {
        let mut scale = 1.0;
        let mut root = Decomposition::new();
        for (name, exp) in units.iter() {
            let unit = self.resolve(name)?;
            scale *= pow_scale(unit.factor, exp);
            root = root.multiply(&unit.reference.power(exp)?)?;
        }
        Ok((scale, root))
    }

    /// Reduce to SI base units (root units with kilogram for gram)
    pub fn base_units(&self, units: &Decomposition) -> Result<(f64, Decomposition), UnitError> {
        let (mut scale, mut base) = self.root_units(units)?;
        for (root, target, per_base) in BASE_SYSTEM {
            if let Some(exp) = base.get(root) {
                scale /= pow_scale(per_base, exp);
                base = base.rename(root, target)?;
            }
        }
        Ok((scale, base))
    }

    /// Canonical names of registered units with the same dimensionality
    pub fn compatible_units(&self, units: &Decomposition) -> Result<BTreeSet<String>, UnitError> {
        let dim = self.dimensionality_of(units)?;
        Ok(self.units
            .values()
            .filter(|u| !u.is_delta() && u.dimension == dim)
            .map(|u| u.name.clone())
            .collect())
    }

    // ========== Conversion ==========

    fn offset_units(&self, units: &Decomposition) -> Result<Vec<(Unit, Exponent)>, UnitError> {
        let mut offset_units = Vec::new();
        for (name, exp) in units.iter() {
            let unit = self.resolve(name)?;
            if !unit.is_multiplicative() {
                offset_units.push((unit.into_owned(), exp));
            }
        }
        Ok(offset_units)
    }

    // Affine map of `units` into root space. An offset is honoured only when
    // the decomposition is exactly one offset unit with exponent 1.
    fn root_transform(&self, units: &Decomposition, from: &Decomposition, to: &Decomposition) -> Result<(f64, f64), UnitError> {
        match self.offset_units(units)?.as_slice() {
            [] => Ok((self.root_units(units)?.0, 0.0)),
            [(unit, exp)] if units.len() == 1 && exp.is_one() => Ok((unit.factor, unit.offset)),
            _ => Err(UnitError::offset(from.to_string(), to.to_string())),
        }
    }

    /// Build the converter between two decompositions
    pub fn converter(&self, from: &Decomposition, to: &Decomposition) -> Result<Converter, UnitError> {
        if from == to {
            return Ok(Converter::IDENTITY);
        }

        let from_dim = self.dimensionality_of(from)?;
        let to_dim = self.dimensionality_of(to)?;
        if from_dim != to_dim {
            return Err(UnitError::Dimensionality {
                from: from.to_string(),
                to: to.to_string(),
                from_dim,
                to_dim,
            });
        }

        let conv = Converter::between(
            self.root_transform(from, from, to)?,
            self.root_transform(to, from, to)?,
        );
        trace!(from = %from, to = %to, factor = conv.factor, shift = conv.shift, "unit conversion");
        Ok(conv)
    }

    /// Converter between two unit strings
    pub fn converter_for(&self, from: &str, to: &str) -> Result<Converter, UnitError> {
        self.converter(&self.decompose(from)?, &self.decompose(to)?)
    }

    pub fn convert_value(&self, value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
        Ok(self.converter_for(from, to)?.apply(value))
    }

    /// Convert a buffer into a new one
    pub fn convert<S, D>(&self, values: &ArrayBase<S, D>, from: &str, to: &str) -> Result<Array<f64, D>, UnitError>
    where
        S: Data<Elem = f64>,
        D: NdDimension,
    {
        let conv = self.converter_for(from, to)?;
        Ok(values.mapv(|v| conv.apply(v)))
    }

    /// Convert a buffer in place; untouched on error
    pub fn convert_in_place<S, D>(&self, values: &mut ArrayBase<S, D>, from: &str, to: &str) -> Result<(), UnitError>
    where
        S: DataMut<Elem = f64>,
        D: NdDimension,
    {
        let conv = self.converter_for(from, to)?;
        if !conv.is_identity() {
            values.mapv_inplace(|v| conv.apply(v));
        }
        Ok(())
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new(RegistryOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{LENGTH, MASS, TEMPERATURE, TIME};
    use crate::Exponent;
    use ndarray::array;

    fn reg() -> UnitRegistry {
        UnitRegistry::default()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0), "{} != {}", a, b);
    }

    #[test]
    fn test_unit_registry() {
        let reg = reg();

        // Test basic lookup
        assert_eq!(reg.canonical_name("m").unwrap(), "meter");
        assert_eq!(reg.canonical_name("kg").unwrap(), "kilogram");
        assert_eq!(reg.canonical_name("s").unwrap(), "second");

        // Test alias, prefix and plural lookup
        assert_eq!(reg.canonical_name("metre").unwrap(), "meter");
        assert_eq!(reg.canonical_name("meters").unwrap(), "meter");
        assert_eq!(reg.canonical_name("kilometers").unwrap(), "kilometer");
        assert_eq!(reg.canonical_name("ms").unwrap(), "millisecond");
        assert_eq!(reg.canonical_name("min").unwrap(), "minute");
        assert_eq!(reg.canonical_name("hours").unwrap(), "hour");
        assert_eq!(reg.canonical_name("degC").unwrap(), "degree_Celsius");
        assert_eq!(reg.canonical_name("delta_degC").unwrap(), "delta_degree_Celsius");

        // Test unknown unit
        assert!(matches!(reg.canonical_name("unknown_xyz"), Err(UnitError::UndefinedUnit(_))));
    }

    #[test]
    fn test_builtin_definitions_load() {
        let reg = UnitRegistry::try_new(RegistryOptions::default()).unwrap();
        assert!(reg.is_valid("degF"));
        assert!(UnitRegistry::try_new(RegistryOptions { autoconvert_offset_to_base_unit: true }).is_ok());
    }

    #[test]
    fn test_plural_beats_prefix_with_plural() {
        let reg = reg();
        // "m" + "ins" would be milli-inch
        assert_eq!(reg.canonical_name("mins").unwrap(), "minute");
        assert_close(reg.convert_value(2.0, "mins", "s").unwrap(), 120.0);
        // a prefix on an exact unit still wins over a plural
        assert_eq!(reg.canonical_name("ms").unwrap(), "millisecond");
        assert_eq!(reg.canonical_name("kilometers").unwrap(), "kilometer");
        assert_eq!(reg.canonical_name("minch").unwrap(), "milliinch");
    }

    #[test]
    fn test_no_prefixed_offset_units() {
        let reg = reg();
        assert!(reg.resolve("kilodegC").is_err());
        assert!(reg.resolve("kdelta_degC").is_err());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for s in ["%", "°C", "m/s", "percent", "° east", ""] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
        assert_eq!(normalize("%"), "percent");
        assert_eq!(normalize("°"), "degree");
    }

    #[test]
    fn test_is_valid() {
        let reg = reg();
        assert!(reg.is_valid("%"));
        assert!(reg.is_valid("°C"));
        assert!(reg.is_valid("degrees_north"));
        assert!(reg.is_valid("degreesE"));
        assert!(reg.is_valid("kg m / s ** 2"));
        assert!(reg.is_valid(""));
        assert!(!reg.is_valid("furlongs_per_fortnight"));
        assert!(!reg.is_valid("m /"));
    }

    #[test]
    fn test_decompose() {
        let reg = reg();
        let d = reg.decompose("km/h").unwrap();
        assert_eq!(d.get("kilometer"), Some(Exponent::one()));
        assert_eq!(d.get("hour"), Some(-Exponent::one()));
        assert_eq!(reg.decompose("m/s").unwrap(), reg.decompose("meter / second").unwrap());
        assert!(matches!(reg.decompose("1000 * m"), Err(UnitError::Parse { .. })));
    }

    #[test]
    fn test_dimensionality() {
        let reg = reg();
        assert_eq!(reg.get_dimensionality("km").unwrap(), Dimension::base(LENGTH));
        assert_eq!(reg.get_dimensionality("degF").unwrap(), Dimension::base(TEMPERATURE));
        assert_eq!(reg.get_dimensionality("N").unwrap().name(), Some("force"));
        assert_eq!(reg.get_dimensionality("Hz").unwrap(), Dimension::base(TIME).invert().unwrap());
        assert!(reg.get_dimensionality("percent").unwrap().is_dimensionless());
        assert_eq!(
            reg.get_dimensionality("degrees_north").unwrap(),
            reg.get_dimensionality("degree").unwrap()
        );
    }

    #[test]
    fn test_multiplicative() {
        let reg = reg();
        assert!(!reg.is_multiplicative("degC").unwrap());
        assert!(!reg.is_multiplicative("degree_Fahrenheit").unwrap());
        assert!(reg.is_multiplicative("delta_degC").unwrap());
        assert!(reg.is_multiplicative("kelvin").unwrap());
        assert!(reg.is_multiplicative("degR").unwrap());
    }

    #[test]
    fn test_root_and_base_units() {
        let reg = reg();
        let (scale, root) = reg.root_units(&reg.decompose("km").unwrap()).unwrap();
        assert_eq!(scale, 1000.0);
        assert_eq!(root, Decomposition::single("meter"));

        let (scale, root) = reg.root_units(&reg.decompose("N").unwrap()).unwrap();
        assert_close(scale, 1000.0);
        assert_eq!(root.get("gram"), Some(Exponent::one()));

        let (scale, base) = reg.base_units(&reg.decompose("N").unwrap()).unwrap();
        assert_close(scale, 1.0);
        assert_eq!(base.get("kilogram"), Some(Exponent::one()));
        assert_eq!(base.get("second"), Some(Exponent::from_integer(-2)));

        let (scale, base) = reg.base_units(&reg.decompose("g").unwrap()).unwrap();
        assert_close(scale, 1e-3);
        assert_eq!(reg.dimensionality_of(&base).unwrap(), Dimension::base(MASS));
    }

    #[test]
    fn test_percent_is_scaled_count() {
        let reg = reg();
        assert_close(reg.convert_value(50.0, "percent", "").unwrap(), 0.5);
        assert_close(reg.convert_value(50.0, "%", "count").unwrap(), 0.5);
    }

    #[test]
    fn test_temperature_conversions() {
        let reg = reg();
        assert_close(reg.convert_value(0.0, "degC", "K").unwrap(), 273.15);
        assert_close(reg.convert_value(100.0, "degC", "degF").unwrap(), 212.0);
        assert_close(reg.convert_value(32.0, "degF", "degC").unwrap(), 0.0);
        // differences convert by scale only
        assert_close(reg.convert_value(10.0, "delta_degC", "delta_degF").unwrap(), 18.0);
        assert_close(reg.convert_value(10.0, "delta_degC", "K").unwrap(), 10.0);
    }

    #[test]
    fn test_offset_units_in_compound_rejected() {
        let reg = reg();
        let err = reg.convert_value(1.0, "degC / s", "K / s").unwrap_err();
        assert!(matches!(err, UnitError::OffsetUnitCalculus { .. }));
        // exponent other than one
        assert!(reg.convert_value(1.0, "degC ** 2", "K ** 2").is_err());
    }

    #[test]
    fn test_unit_defined_from_offset_unit() {
        let mut reg = reg();
        reg.define("celsius_alias = degC").unwrap();
        assert!(!reg.is_multiplicative("celsius_alias").unwrap());
        assert_close(reg.convert_value(0.0, "celsius_alias", "K").unwrap(), 273.15);
        assert_close(reg.convert_value(100.0, "celsius_alias", "degF").unwrap(), 212.0);
        assert_eq!(reg.canonical_name("delta_celsius_alias").unwrap(), "delta_celsius_alias");
        assert_close(reg.convert_value(10.0, "delta_celsius_alias", "delta_degF").unwrap(), 18.0);

        // own offset is in units of the reference
        reg.define("shifted = 2 * degC; offset: 10").unwrap();
        assert_close(reg.convert_value(0.0, "shifted", "degC").unwrap(), 10.0);
        assert_close(reg.convert_value(1.0, "shifted", "K").unwrap(), 285.15);
    }

    #[test]
    fn test_offset_unit_in_compound_definition_rejected() {
        let mut reg = reg();
        for line in ["bad = kelvin / degC", "bad = degC ** 2", "bad = degC * meter"] {
            assert!(matches!(reg.define(line), Err(UnitError::Definition { .. })), "{}", line);
        }
        assert!(!reg.is_valid("bad"));
        // delta units are plain multiplicative units
        reg.define("rate = delta_degC / second").unwrap();
        assert!(reg.is_multiplicative("rate").unwrap());
    }

    #[test]
    fn test_exponent_overflow_rejected() {
        let reg = reg();
        assert!(!reg.is_valid("(m ** 9223372036854775807) ** 2"));
        assert!(!reg.is_valid("m ** 9223372036854775807 * m"));
        assert!(matches!(
            reg.decompose("(m ** 9223372036854775807) ** 2"),
            Err(UnitError::Parse { .. })
        ));
        // exponents beyond i32 are not truncated
        let v = reg.convert_value(1.0, "km ** 4294967296", "m ** 4294967296").unwrap();
        assert_eq!(v, f64::INFINITY);
    }

    #[test]
    fn test_dimensionality_error() {
        let reg = reg();
        let err = reg.convert_value(1.0, "m", "s").unwrap_err();
        match err {
            UnitError::Dimensionality { from, to, from_dim, to_dim } => {
                assert_eq!(from, "meter");
                assert_eq!(to, "second");
                assert_eq!(from_dim, Dimension::base(LENGTH));
                assert_eq!(to_dim, Dimension::base(TIME));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_convert_buffers() {
        let reg = reg();
        let values = array![1.0, 2.5];
        let out = reg.convert(&values, "km", "m").unwrap();
        assert_eq!(out, array![1000.0, 2500.0]);

        let mut values = array![0.0, 100.0];
        reg.convert_in_place(&mut values, "degC", "K").unwrap();
        assert_close(values[1], 373.15);

        let mut values = array![1.0];
        assert!(reg.convert_in_place(&mut values, "m", "s").is_err());
        assert_eq!(values, array![1.0]);
    }

    #[test]
    fn test_compatible_units() {
        let reg = reg();
        let compat = reg.compatible_units(&reg.decompose("m").unwrap()).unwrap();
        assert!(compat.contains("meter"));
        assert!(compat.contains("mile"));
        assert!(!compat.contains("second"));

        let temps = reg.compatible_units(&reg.decompose("degC").unwrap()).unwrap();
        assert!(temps.contains("kelvin"));
        assert!(temps.contains("degree_Fahrenheit"));
        assert!(!temps.contains("delta_degree_Celsius"));
    }

    #[test]
    fn test_parse_quantity() {
        let reg = reg();
        assert_eq!(reg.parse_quantity("5 km").unwrap(), (5.0, "kilometer".to_string()));
        assert_eq!(reg.parse_quantity("20 %").unwrap(), (20.0, "percent".to_string()));
        assert!(reg.parse_quantity("5 blorps").is_err());
    }

    #[test]
    fn test_isolated_define() {
        let mut reg = UnitRegistry::empty(RegistryOptions::default());
        reg.define("meter = [length] = m").unwrap();
        reg.define("furlong = 201.168 * meter").unwrap();
        assert_close(reg.convert_value(1.0, "furlong", "m").unwrap(), 201.168);
        assert!(reg.define("bogus = 3 * nothing_here").is_err());
        // shared default registry is unaffected
        assert!(!UnitRegistry::default_shared().is_valid("furlong"));
    }
}
