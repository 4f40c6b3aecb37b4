//! Formula compilation and evaluation
//!
//! Formulas compile to an `evalexpr` operator tree once and are evaluated
//! many times with the raw sample bound to the declared variable. The raw
//! integer is bound as a float so division behaves like the definition
//! files expect (`255 / 2` is `127.5`, not integer division).

use crate::error::{MapTuneError, Result};
use crate::formula::{cache_poisoned, CompiledFormula, SharedFormulaCache};
use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Value};

/// Compile a formula bound to one named variable.
///
/// Fails with [`MapTuneError::Formula`] if the expression is syntactically
/// malformed, calls any function, or references an identifier other than
/// `variable`.
pub(crate) fn compile(source: &str, variable: &str) -> Result<CompiledFormula> {
    let node = build_operator_tree(source)
        .map_err(|e| MapTuneError::Formula(format!("parse error in '{}': {}", source, e)))?;

    // The grammar is arithmetic over one bound variable; no function calls.
    if let Some(name) = node.iter_function_identifiers().next() {
        return Err(MapTuneError::Formula(format!(
            "function call '{}' not allowed in '{}'",
            name, source
        )));
    }

    for name in node.iter_variable_identifiers() {
        if name != variable {
            return Err(MapTuneError::Formula(format!(
                "unknown identifier '{}' in '{}' (bound variable is '{}')",
                name, source, variable
            )));
        }
    }

    Ok(CompiledFormula {
        node,
        source: source.to_string(),
        variable: variable.to_string(),
    })
}

/// The formula engine: compiles conversion formulas and evaluates them
/// against raw integer samples.
///
/// Compiled formulas are cached so repeated decodes of the same definition
/// set parse each formula only once.
#[derive(Debug, Default)]
pub struct FormulaEngine {
    cache: SharedFormulaCache,
}

impl FormulaEngine {
    /// Create a new engine with its own cache
    pub fn new() -> Self {
        Self {
            cache: crate::formula::create_shared_cache(),
        }
    }

    /// Create an engine sharing an existing cache
    pub fn with_cache(cache: SharedFormulaCache) -> Self {
        Self { cache }
    }

    /// Compile a formula, reusing the cache where possible
    pub fn compile(&self, source: &str, variable: &str) -> Result<CompiledFormula> {
        let mut cache = self.cache.write().map_err(|_| cache_poisoned())?;
        cache.get_or_compile(source, variable)
    }

    /// Evaluate a compiled formula against one raw sample
    pub fn eval(&self, formula: &CompiledFormula, raw: i64) -> Result<f64> {
        let mut context = HashMapContext::new();
        context
            .set_value(formula.variable().to_string(), Value::Float(raw as f64))
            .map_err(|e| MapTuneError::Formula(format!("failed to bind variable: {}", e)))?;

        formula.node().eval_number_with_context(&context).map_err(|e| {
            MapTuneError::Formula(format!(
                "evaluation of '{}' failed for {}={}: {}",
                formula.source(),
                formula.variable(),
                raw,
                e
            ))
        })
    }

    /// Compile and evaluate in one step (for one-off conversions)
    pub fn eval_once(&self, source: &str, variable: &str, raw: i64) -> Result<f64> {
        let formula = self.compile(source, variable)?;
        self.eval(&formula, raw)
    }

    /// Validate a formula without evaluating it
    pub fn validate(&self, source: &str, variable: &str) -> Result<()> {
        compile(source, variable).map(|_| ())
    }

    /// Get a reference to the shared cache
    pub fn cache(&self) -> &SharedFormulaCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_division() {
        let engine = FormulaEngine::new();
        assert_eq!(engine.eval_once("x / 2", "x", 4).unwrap(), 2.0);
        // Raw binds as float, so this is not integer division
        assert_eq!(engine.eval_once("x / 2", "x", 5).unwrap(), 2.5);
    }

    #[test]
    fn test_operator_precedence() {
        let engine = FormulaEngine::new();
        assert_eq!(engine.eval_once("x + 3 * 4", "x", 2).unwrap(), 14.0);
        assert_eq!(engine.eval_once("(x + 3) * 4", "x", 2).unwrap(), 20.0);
    }

    #[test]
    fn test_exponentiation() {
        let engine = FormulaEngine::new();
        assert_eq!(engine.eval_once("x ^ 2", "x", 3).unwrap(), 9.0);
    }

    #[test]
    fn test_negative_raw() {
        let engine = FormulaEngine::new();
        assert_eq!(engine.eval_once("x * 0.75", "x", -64).unwrap(), -48.0);
    }

    #[test]
    fn test_constant_formula() {
        // A formula may ignore the variable entirely
        let engine = FormulaEngine::new();
        assert_eq!(engine.eval_once("1.5", "x", 99).unwrap(), 1.5);
    }

    #[test]
    fn test_custom_variable_name() {
        let engine = FormulaEngine::new();
        assert_eq!(engine.eval_once("raw * 40", "raw", 2).unwrap(), 80.0);
    }

    #[test]
    fn test_unknown_identifier_rejected() {
        let engine = FormulaEngine::new();
        let err = engine.validate("x + y", "x").unwrap_err();
        assert!(err.to_string().contains("unknown identifier 'y'"));
    }

    #[test]
    fn test_function_call_rejected() {
        let engine = FormulaEngine::new();
        assert!(engine.validate("min(x, 2)", "x").is_err());
    }

    #[test]
    fn test_malformed_formula_rejected() {
        let engine = FormulaEngine::new();
        assert!(engine.validate("x *", "x").is_err());
        assert!(engine.validate("(x + 2", "x").is_err());
    }

    #[test]
    fn test_reuse_without_recompilation() {
        let engine = FormulaEngine::new();
        let formula = engine.compile("x / 2", "x").unwrap();

        for raw in 0..16 {
            assert_eq!(engine.eval(&formula, raw).unwrap(), raw as f64 / 2.0);
        }

        // Cache holds exactly one entry despite many evaluations
        assert_eq!(engine.cache().read().unwrap().len(), 1);
    }

    #[test]
    fn test_spec_axis_formula() {
        // Unsigned byte samples through "x/2" land on physical half-steps
        let engine = FormulaEngine::new();
        let formula = engine.compile("x/2", "x").unwrap();
        let raw = [0x04, 0x08, 0x0C, 0x10];
        let decoded: Vec<f64> = raw
            .iter()
            .map(|&r| engine.eval(&formula, r).unwrap())
            .collect();
        assert_eq!(decoded, vec![2.0, 4.0, 6.0, 8.0]);
    }
}
