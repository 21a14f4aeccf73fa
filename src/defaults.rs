//! Default injection for named arguments.
//!
//! Arguments are passed around as a [JsonMap] of name to value. A missing argument and an
//! explicit `null` both mean "use the default", which lets optional settings flow through several
//! layers without each layer restating the defaults.

use log::debug;
use serde_json::Value;

use crate::utils::JsonMap;

/// Replace every absent or `null` argument that has a default. Arguments without a default are kept as is.
pub fn apply_defaults_on_null(args: &mut JsonMap, defaults: &JsonMap) {
    for (name, default) in defaults {
        let slot = args.entry(name.clone()).or_insert(Value::Null);
        if slot.is_null() {
            debug!("Argument {} defaults to {}", name, default);
            *slot = default.clone();
        }
    }
}

/// Owned variant of [apply_defaults_on_null].
///
/// # Example
/// ```
/// use serde_json::json;
/// use chipprompt::defaults::with_defaults_on_null;
/// let args = json!({"model_size": null, "extra": null}).as_object().unwrap().clone();
/// let defaults = json!({"model_size": "30B"}).as_object().unwrap().clone();
/// let args = with_defaults_on_null(args, &defaults);
/// assert_eq!(args["model_size"], "30B");
/// assert!(args["extra"].is_null());
/// ```
pub fn with_defaults_on_null(mut args: JsonMap, defaults: &JsonMap) -> JsonMap {
    apply_defaults_on_null(&mut args, defaults);
    args
}
