//! Build script for wk2132-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates bridge.toml at compile time
//! - Generates the configuration constants compiled into the firmware

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use wk2132_core::baud::{BaudDivisor, DivisorError};
use wk2132_core::config::BridgeConfig;

/// Firmware settings from the `[firmware]` table
struct FirmwareSettings {
    service_interval_ms: u64,
    i2c_frequency: u32,
    relay: bool,
}

fn main() {
    setup_linker();
    let (config, firmware) = validate_config();
    generate_config(&config, &firmware);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate bridge.toml at compile time
fn validate_config() -> (BridgeConfig, FirmwareSettings) {
    println!("cargo:rerun-if-changed=bridge.toml");

    let config_path = Path::new("bridge.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: bridge.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a bridge.toml configuration file.         ║\n\
            ║  Please create one in the wk2132-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read bridge.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Syntax first, so the message points at the TOML and not at a field
    let raw: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => fail("Invalid TOML syntax in bridge.toml", &[e.to_string()]),
    };

    let config: BridgeConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => fail("Invalid field in bridge.toml", &[e.to_string()]),
    };

    if let Err(e) = config.validate() {
        fail("Invalid bridge configuration", &[e.to_string()]);
    }

    validate_baud_rates(&config);
    let firmware = validate_firmware(&raw);

    println!("cargo:warning=bridge.toml validated successfully");
    (config, firmware)
}

/// Check every channel rate against the crystal
fn validate_baud_rates(config: &BridgeConfig) {
    let errors: Vec<String> = config
        .uart
        .iter()
        .filter_map(|uart| {
            let reason = match BaudDivisor::compute(config.crystal, uart.baud_rate) {
                Ok(_) => return None,
                Err(DivisorError::OutOfTolerance { nearest }) => {
                    format!("nearest reachable rate is {} bps", nearest)
                }
                Err(DivisorError::TooFast) => "too fast for the crystal".to_string(),
                Err(DivisorError::TooSlow) => "too slow for the crystal".to_string(),
                Err(DivisorError::Zero) => "rate must be positive".to_string(),
            };
            Some(format!(
                "uart {} ({} bps): {}",
                uart.channel, uart.baud_rate, reason
            ))
        })
        .collect();

    if !errors.is_empty() {
        fail("Unsupported baud rate in bridge.toml", &errors);
    }
}

/// Validate the `[firmware]` table
fn validate_firmware(raw: &toml::Value) -> FirmwareSettings {
    let table = raw.get("firmware");
    let get = |key: &str| table.and_then(|t| t.get(key));
    let mut errors = Vec::new();

    let service_interval_ms = match get("service_interval_ms") {
        None => 10,
        Some(toml::Value::Integer(ms)) if (1..=1000).contains(ms) => *ms as u64,
        Some(_) => {
            errors.push("service_interval_ms must be an integer in 1..=1000".to_string());
            10
        }
    };

    let i2c_frequency = match get("i2c_frequency") {
        None => 400_000,
        Some(toml::Value::Integer(hz)) if (10_000..=1_000_000).contains(hz) => *hz as u32,
        Some(_) => {
            errors.push("i2c_frequency must be an integer in 10000..=1000000".to_string());
            400_000
        }
    };

    let relay = match get("relay") {
        None => false,
        Some(toml::Value::Boolean(relay)) => *relay,
        Some(_) => {
            errors.push("relay must be true or false".to_string());
            false
        }
    };

    if !errors.is_empty() {
        fail("Invalid [firmware] section in bridge.toml", &errors);
    }

    FirmwareSettings {
        service_interval_ms,
        i2c_frequency,
        relay,
    }
}

/// Write the configuration constants to OUT_DIR
fn generate_config(config: &BridgeConfig, firmware: &FirmwareSettings) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut code = String::new();

    code.push_str("// Generated from bridge.toml by build.rs\n\n");
    code.push_str(&format!(
        "pub const BRIDGE_NAME: &str = {:?};\n",
        config.name.as_str()
    ));
    code.push_str(&format!("pub const ADDRESS: u8 = {:#04x};\n", config.address));
    code.push_str(&format!("pub const CRYSTAL: u32 = {};\n", config.crystal));
    code.push_str(&format!("pub const TEST_MODE: u8 = {};\n", config.test_mode));
    code.push_str(&format!(
        "pub const MAX_TRANSFER: u16 = {};\n",
        config.max_transfer
    ));
    code.push_str(&format!(
        "pub const SERVICE_INTERVAL_MS: u64 = {};\n",
        firmware.service_interval_ms
    ));
    code.push_str(&format!(
        "pub const I2C_FREQUENCY: u32 = {};\n",
        firmware.i2c_frequency
    ));
    code.push_str(&format!("pub const RELAY: bool = {};\n\n", firmware.relay));

    code.push_str("pub const CHANNELS: &[ChannelSpec] = &[\n");
    for uart in &config.uart {
        code.push_str(&format!(
            "    ChannelSpec {{ name: {:?}, channel: {}, baud_rate: {}, stop_bits: {}, parity: Parity::{:?} }},\n",
            uart.name.as_str(),
            uart.channel,
            uart.baud_rate,
            uart.stop_bits,
            uart.parity
        ));
    }
    code.push_str("];\n");

    fs::write(out_dir.join("bridge_config.rs"), code).unwrap();
}

/// Abort the build with a boxed error message
fn fail(title: &str, details: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        details
            .iter()
            .flat_map(|d| d.lines().map(str::to_string).collect::<Vec<_>>())
            .map(|line| format_error_line(&line))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Format one error line with box drawing
fn format_error_line(line: &str) -> String {
    let truncated = if line.chars().count() > 64 {
        format!("{}...", line.chars().take(61).collect::<String>())
    } else {
        line.to_string()
    };
    format!("║  {:<64} ║", truncated)
}
