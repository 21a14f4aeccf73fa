pub mod string;
pub mod token;
pub mod timing;

use serde_json::{Map, Value};

pub type JsonMap = Map<String, Value>;
