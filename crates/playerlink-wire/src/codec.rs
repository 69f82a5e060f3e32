use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, WireError};

/// Namespace prepended to every message name on the wire.
pub const DEFAULT_NAMESPACE: &str = "ceros.sdk.player:";

/// Protocol version stamped on every outbound envelope.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Open parameter object carried by an envelope.
pub type Params = Map<String, Value>;

/// A decoded envelope with the namespace already stripped from `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Dotted event or command name, without namespace.
    pub name: String,
    /// Sender protocol version. Empty when the sender omitted it.
    pub version: String,
    /// Event-specific parameters.
    pub params: Params,
}

impl Envelope {
    /// The peer (experience) id this envelope concerns, if any.
    pub fn peer_id(&self) -> Option<String> {
        id_param(&self.params, "experienceId")
    }

    /// The layer id this envelope concerns, if any.
    pub fn layer_id(&self) -> Option<String> {
        id_param(&self.params, "layerId")
    }

    /// The component id this envelope concerns, if any.
    pub fn component_id(&self) -> Option<String> {
        id_param(&self.params, "componentId")
    }
}

/// Outcome of decoding a raw payload that parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A protocol message for us.
    Envelope(Envelope),
    /// Someone else's message: no name, or a name outside our namespace.
    Foreign { name: Option<String> },
}

/// Namespace and version used when encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireConfig {
    /// Required prefix on every message name.
    pub namespace: String,
    /// Version stamped on outbound envelopes.
    pub version: String,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }
}

impl WireConfig {
    /// Override the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Override the outbound version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Reject configurations that would match every sender.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(WireError::InvalidNamespace(self.namespace.clone()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    name: String,
    version: &'a str,
    params: &'a Params,
}

/// Encode a command into its wire string.
///
/// Wire format:
/// ```text
/// {"name":"<namespace><command>","version":"<version>","params":{...}}
/// ```
pub fn encode_envelope(name: &str, params: &Params, config: &WireConfig) -> Result<String> {
    let envelope = OutboundEnvelope {
        name: format!("{}{}", config.namespace, name),
        version: &config.version,
        params,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode a raw wire payload.
///
/// Returns `Decoded::Foreign` for well-formed JSON that is not ours, and an
/// error for payloads that are not JSON or whose protocol fields have the
/// wrong type.
pub fn decode_envelope(data: &str, config: &WireConfig) -> Result<Decoded> {
    let value: Value = serde_json::from_str(data)?;

    let Value::Object(mut object) = value else {
        return Ok(Decoded::Foreign { name: None });
    };

    let name = match object.remove("name") {
        None | Some(Value::Null) => return Ok(Decoded::Foreign { name: None }),
        Some(Value::String(name)) => name,
        Some(_) => return Err(WireError::InvalidName),
    };

    if !name.starts_with(config.namespace.as_str()) {
        return Ok(Decoded::Foreign { name: Some(name) });
    }
    let stripped = name[config.namespace.len()..].to_string();

    let params = match object.remove("params") {
        None | Some(Value::Null) => Params::new(),
        Some(Value::Object(params)) => params,
        Some(_) => return Err(WireError::InvalidParams { name: stripped }),
    };

    let version = match object.remove("version") {
        Some(Value::String(version)) => version,
        Some(other) if !other.is_null() => other.to_string(),
        _ => String::new(),
    };

    Ok(Decoded::Envelope(Envelope {
        name: stripped,
        version,
        params,
    }))
}

/// Read an identifier parameter.
///
/// Ids arrive as strings, but numeric ids are accepted and rendered in
/// decimal. Empty strings count as absent.
pub fn id_param(params: &Params, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("test params must be an object"),
        }
    }

    #[test]
    fn encode_prefixes_namespace_and_version() {
        let config = WireConfig::default();
        let wire = encode_envelope(
            "sdk.layer.show",
            &params(json!({"layerId": "l1"})),
            &config,
        )
        .unwrap();

        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["name"], "ceros.sdk.player:sdk.layer.show");
        assert_eq!(value["version"], "1.0.0");
        assert_eq!(value["params"]["layerId"], "l1");
    }

    #[test]
    fn decode_strips_namespace() {
        let config = WireConfig::default();
        let raw = concat!(
            r#"{"name":"ceros.sdk.player:page.changed","version":"1.0.0","#,
            r#""params":{"experienceId":"e1","pageNum":2}}"#
        );

        let Decoded::Envelope(envelope) = decode_envelope(raw, &config).unwrap() else {
            panic!("expected envelope");
        };
        assert_eq!(envelope.name, "page.changed");
        assert_eq!(envelope.version, "1.0.0");
        assert_eq!(envelope.peer_id().as_deref(), Some("e1"));
        assert_eq!(envelope.params["pageNum"], 2);
    }

    #[test]
    fn foreign_namespace_is_not_an_error() {
        let config = WireConfig::default();
        let decoded =
            decode_envelope(r#"{"name":"other.app:ping","params":{}}"#, &config).unwrap();
        assert_eq!(
            decoded,
            Decoded::Foreign {
                name: Some("other.app:ping".to_string())
            }
        );
    }

    #[test]
    fn namespace_must_be_a_prefix_not_a_substring() {
        let config = WireConfig::default();
        let decoded =
            decode_envelope(r#"{"name":"x.ceros.sdk.player:ready"}"#, &config).unwrap();
        assert!(matches!(decoded, Decoded::Foreign { .. }));
    }

    #[test]
    fn missing_name_and_non_objects_are_foreign() {
        let config = WireConfig::default();
        assert_eq!(
            decode_envelope(r#"{"params":{}}"#, &config).unwrap(),
            Decoded::Foreign { name: None }
        );
        assert_eq!(
            decode_envelope("[1,2,3]", &config).unwrap(),
            Decoded::Foreign { name: None }
        );
        assert_eq!(
            decode_envelope(r#""just a string""#, &config).unwrap(),
            Decoded::Foreign { name: None }
        );
    }

    #[test]
    fn malformed_payloads_are_errors() {
        let config = WireConfig::default();
        assert!(matches!(
            decode_envelope("{not-json", &config),
            Err(WireError::InvalidJson(_))
        ));
        assert!(matches!(
            decode_envelope(r#"{"name":42}"#, &config),
            Err(WireError::InvalidName)
        ));
        assert!(matches!(
            decode_envelope(r#"{"name":"ceros.sdk.player:ready","params":[1]}"#, &config),
            Err(WireError::InvalidParams { .. })
        ));
    }

    #[test]
    fn missing_params_decode_as_empty() {
        let config = WireConfig::default();
        let Decoded::Envelope(envelope) =
            decode_envelope(r#"{"name":"ceros.sdk.player:ready"}"#, &config).unwrap()
        else {
            panic!("expected envelope");
        };
        assert!(envelope.params.is_empty());
        assert!(envelope.version.is_empty());
        assert!(envelope.peer_id().is_none());
    }

    #[test]
    fn custom_namespace_round_trips() {
        let config = WireConfig::default().with_namespace("acme:").with_version("2.1.0");
        let wire = encode_envelope("sdk.component.click", &Params::new(), &config).unwrap();
        let Decoded::Envelope(envelope) = decode_envelope(&wire, &config).unwrap() else {
            panic!("expected envelope");
        };
        assert_eq!(envelope.name, "sdk.component.click");
        assert_eq!(envelope.version, "2.1.0");

        let default = WireConfig::default();
        assert!(matches!(
            decode_envelope(&wire, &default).unwrap(),
            Decoded::Foreign { .. }
        ));
    }

    #[test]
    fn empty_namespace_is_rejected() {
        let config = WireConfig::default().with_namespace("");
        assert!(matches!(
            config.validate(),
            Err(WireError::InvalidNamespace(_))
        ));
        assert!(WireConfig::default().validate().is_ok());
    }

    #[test]
    fn id_param_accepts_strings_and_numbers() {
        let p = params(json!({"a": "x", "b": 12, "c": "", "d": true}));
        assert_eq!(id_param(&p, "a").as_deref(), Some("x"));
        assert_eq!(id_param(&p, "b").as_deref(), Some("12"));
        assert_eq!(id_param(&p, "c"), None);
        assert_eq!(id_param(&p, "d"), None);
        assert_eq!(id_param(&p, "missing"), None);
    }
}
