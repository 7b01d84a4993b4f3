use std::collections::HashMap;

use serde_json::{Map, Value};
use swc_ecma_ast::{BinaryOp, Expr, Lit, Prop, PropName, PropOrSpread, Tpl, UnaryOp};

/// Constant-folding environment for a single file.
///
/// `evaluate` is total: `Some(value)` means the fold is confident, `None`
/// means the expression is not statically known. The caller decides whether
/// that is an error. Module-level `const` bindings whose initializers folded
/// are recorded with `define` and resolve by name.
#[derive(Debug, Default)]
pub struct StaticEnv {
    consts: HashMap<String, Value>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.consts.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.consts.get(name)
    }

    /// Fold an expression to a concrete value when possible.
    pub fn evaluate(&self, expr: &Expr) -> Option<Value> {
        match expr {
            Expr::Lit(lit) => evaluate_lit(lit),
            Expr::Paren(paren) => self.evaluate(&paren.expr),
            Expr::Tpl(tpl) => self.evaluate_template(tpl),
            Expr::Ident(ident) => self.lookup(ident.sym.as_ref()).cloned(),
            Expr::Unary(unary) if unary.op == UnaryOp::Minus => {
                let value = self.evaluate(&unary.arg)?;
                number_value(-value.as_f64()?)
            }
            Expr::Bin(bin) => {
                let left = self.evaluate(&bin.left)?;
                let right = self.evaluate(&bin.right)?;
                fold_binary(bin.op, &left, &right)
            }
            Expr::Object(obj) => {
                let mut map = Map::new();
                for prop in &obj.props {
                    let PropOrSpread::Prop(prop) = prop else {
                        return None;
                    };
                    match prop.as_ref() {
                        Prop::KeyValue(kv) => {
                            let key = prop_name_text(&kv.key)?;
                            map.insert(key, self.evaluate(&kv.value)?);
                        }
                        Prop::Shorthand(ident) => {
                            let value = self.lookup(ident.sym.as_ref())?.clone();
                            map.insert(ident.sym.to_string(), value);
                        }
                        _ => return None,
                    }
                }
                Some(Value::Object(map))
            }
            Expr::Array(arr) => {
                let mut values = Vec::with_capacity(arr.elems.len());
                for elem in &arr.elems {
                    let elem = elem.as_ref()?;
                    if elem.spread.is_some() {
                        return None;
                    }
                    values.push(self.evaluate(&elem.expr)?);
                }
                Some(Value::Array(values))
            }
            _ => None,
        }
    }

    /// Template literals fold when every interpolation folds to a scalar.
    fn evaluate_template(&self, tpl: &Tpl) -> Option<Value> {
        let mut result = String::new();
        for (i, quasi) in tpl.quasis.iter().enumerate() {
            match quasi.cooked.as_ref() {
                Some(cooked) => result.push_str(cooked.as_str()?),
                None => result.push_str(&quasi.raw),
            }
            if let Some(expr) = tpl.exprs.get(i) {
                let value = self.evaluate(expr)?;
                result.push_str(&scalar_to_js_string(&value)?);
            }
        }
        Some(Value::String(result))
    }
}

/// Textual form of a non-computed property key.
pub fn prop_name_text(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => s.value.as_str().map(|s| s.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}

fn evaluate_lit(lit: &Lit) -> Option<Value> {
    match lit {
        Lit::Str(s) => s.value.as_str().map(|s| Value::String(s.to_string())),
        Lit::Num(n) => number_value(n.value),
        Lit::Bool(b) => Some(Value::Bool(b.value)),
        Lit::Null(_) => Some(Value::Null),
        _ => None,
    }
}

fn fold_binary(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    if op == BinaryOp::Add && (left.is_string() || right.is_string()) {
        let mut joined = scalar_to_js_string(left)?;
        joined.push_str(&scalar_to_js_string(right)?);
        return Some(Value::String(joined));
    }

    let (l, r) = (left.as_f64()?, right.as_f64()?);
    let result = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        _ => return None,
    };
    number_value(result)
}

/// JS-style string form of a foldable scalar; structured values never
/// participate in concatenation.
fn scalar_to_js_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_value(value: f64) -> Option<Value> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        return Some(Value::from(value as i64));
    }
    serde_json::Number::from_f64(value).map(Value::Number)
}
