//! Response schema registry (§3 `responseSchemas`)

use std::collections::HashMap;

/// Named JSON-Schema fragments, referenced by `Variant.responseFormat`.
/// Stored as raw `serde_json::Value` since each fragment is validated as a
/// JSON-Schema document itself (§4.1 step 3), not deserialized into a typed
/// shape.
pub type ResponseSchemas = HashMap<String, serde_json::Value>;
