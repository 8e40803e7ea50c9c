//! Modules reachable through `require`.
//!
//! Only the names in [`ALLOWED_MODULES`] resolve; everything else fails.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rhai::{Dynamic, Engine, EvalAltResult};
use sha2::{Digest, Sha256};

use super::convert::runtime_error;

/// Module names scripts may `require`.
pub const ALLOWED_MODULES: [&str; 3] = ["uuid", "base64", "crypto"];

#[derive(Debug, Clone, Copy)]
struct UuidModule;

#[derive(Debug, Clone, Copy)]
struct Base64Module;

#[derive(Debug, Clone, Copy)]
struct CryptoModule;

/// Resolves a module name against the allow-list.
///
/// # Errors
///
/// Fails for any name outside the allow-list.
pub fn require(name: &str) -> Result<Dynamic, Box<EvalAltResult>> {
    match name {
        "uuid" => Ok(Dynamic::from(UuidModule)),
        "base64" => Ok(Dynamic::from(Base64Module)),
        "crypto" => Ok(Dynamic::from(CryptoModule)),
        other => Err(runtime_error(format!(
            "module '{other}' is not available in the script sandbox (allowed: {})",
            ALLOWED_MODULES.join(", ")
        ))),
    }
}

fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Registers `require` and the module types on `engine`.
pub fn register(engine: &mut Engine) {
    engine.register_fn("require", require);

    engine
        .register_type_with_name::<UuidModule>("uuid")
        .register_fn("v4", |_: &mut UuidModule| uuid::Uuid::new_v4().to_string());

    engine
        .register_type_with_name::<Base64Module>("base64")
        .register_fn("encode", |_: &mut Base64Module, text: &str| STANDARD.encode(text))
        .register_fn(
            "decode",
            |_: &mut Base64Module, text: &str| -> Result<String, Box<EvalAltResult>> {
                let bytes = STANDARD
                    .decode(text)
                    .map_err(|e| runtime_error(format!("base64.decode: {e}")))?;
                String::from_utf8(bytes).map_err(|e| runtime_error(format!("base64.decode: {e}")))
            },
        );

    engine
        .register_type_with_name::<CryptoModule>("crypto")
        .register_fn("sha256", |_: &mut CryptoModule, text: &str| sha256_hex(text));
}
