//! jq filters over input documents, evaluated with `jaq`.
use std::fmt::Debug;

use anyhow::{Result, anyhow};
use jaq_core::{Compiler, Ctx, RcIter, load};
use jaq_json::Val;
use serde_json::Value;

/// Runs `filter_src` on `input` and collects every output.
pub fn run_jaq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(|errs| filter_error("parse", errs))?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| filter_error("compile", errs))?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    outputs
        .map(|item| {
            item.map(Value::from)
                .map_err(|e| anyhow!("jq runtime error in `{filter_src}`: {e:?}"))
        })
        .collect()
}

/// One message for every failed file of a filter program.
fn filter_error<E: Debug>(stage: &str, errs: Vec<(load::File<&str, ()>, E)>) -> anyhow::Error {
    let details: Vec<String> = errs
        .into_iter()
        .map(|(file, err)| format!("{err:?} in `{}`", file.code))
        .collect();
    anyhow!("jq {stage} error: {}", details.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_and_splits() {
        let doc = json!({"users": [{"name": "a"}, {"name": "b"}]});
        let out = run_jaq(".users[]", &doc).unwrap();
        assert_eq!(out, vec![json!({"name": "a"}), json!({"name": "b"})]);
    }

    #[test]
    fn outputs_keep_scalar_kinds() {
        let out = run_jaq("[.n, .n * 1.5, .s, .b, .z]", &json!({"n": 2, "s": "x", "b": true})).unwrap();
        assert_eq!(out, vec![json!([2, 3.0, "x", true, null])]);
    }

    #[test]
    fn parse_and_compile_errors_name_the_stage() {
        let err = run_jaq(".users[", &json!({})).unwrap_err().to_string();
        assert!(err.starts_with("jq parse error"), "{err}");
        let err = run_jaq("no_such_function(1)", &json!({})).unwrap_err().to_string();
        assert!(err.starts_with("jq compile error"), "{err}");
    }
}
