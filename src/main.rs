//! Minimal operator CLI for the security subsystem. Commands are
//! intentionally small and auditable so operators can see exactly how
//! field values and credentials are handled.

use std::env;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use serde_json::json;

use ecotech_security::config::load_config;
use ecotech_security::crypto::cipher::{CipherKey, FieldCipher};
use ecotech_security::crypto::passwords::{hash_password, verify_password};

fn print_usage() {
    eprintln!("Commands:\n  hash-password <plaintext>\n  verify-password <plaintext> <hash-record>\n  encrypt-field <env_var_with_base64_key> <plaintext>\n  decrypt-field <env_var_with_base64_key> <base64-ciphertext>\n  load-config <path>");
}

fn cipher_from_env(var: &str) -> Result<FieldCipher, String> {
    let encoded = env::var(var).map_err(|e| format!("{e}"))?;
    let decoded = STANDARD_NO_PAD
        .decode(encoded.as_bytes())
        .map_err(|e| format!("{e}"))?;
    let key = CipherKey::from_bytes(&decoded).map_err(|e| format!("{e}"))?;
    Ok(FieldCipher::new(key))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "hash-password" => {
            if args.len() != 3 {
                return print_usage();
            }
            match hash_password(&args[2]) {
                Ok(record) => println!("{record}"),
                Err(err) => eprintln!("hashing failed: {err}"),
            }
        }
        "verify-password" => {
            if args.len() != 4 {
                return print_usage();
            }
            let matches = verify_password(&args[2], &args[3]);
            println!("{}", if matches { "match" } else { "no-match" });
        }
        "encrypt-field" => {
            if args.len() != 4 {
                return print_usage();
            }
            let cipher = match cipher_from_env(&args[2]) {
                Ok(cipher) => cipher,
                Err(err) => return eprintln!("cipher setup failed: {err}"),
            };
            println!("{}", STANDARD_NO_PAD.encode(cipher.encrypt(&args[3])));
        }
        "decrypt-field" => {
            if args.len() != 4 {
                return print_usage();
            }
            let cipher = match cipher_from_env(&args[2]) {
                Ok(cipher) => cipher,
                Err(err) => return eprintln!("cipher setup failed: {err}"),
            };
            let blob = match STANDARD_NO_PAD.decode(args[3].as_bytes()) {
                Ok(blob) => blob,
                Err(err) => return eprintln!("invalid base64 ciphertext: {err}"),
            };
            match cipher.decrypt(&blob) {
                Ok(text) => println!("{text}"),
                Err(err) => eprintln!("decryption failed: {err}"),
            }
        }
        "load-config" => {
            if args.len() != 3 {
                return print_usage();
            }
            match load_config(&args[2]) {
                Ok(config) => {
                    let printable = json!({
                        "debugLevel": config.debug_level,
                        "cipherKey": "<loaded; redacted in output>"
                    });
                    println!("{}", serde_json::to_string_pretty(&printable).unwrap());
                }
                Err(err) => {
                    eprintln!("config load failed: {err}");
                    std::process::exit(1);
                }
            }
        }
        _ => print_usage(),
    }
}
