//! Controller configuration.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. Defaults match the tuning of the
//! reference hardware (a small geared DC motor on a spring-loaded latch).
//!
//! # Example
//!
//! ```rust
//! use rs_parcelbox::config::{Config, MotorConfig, MqttConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.timing.opening_delay_ms, 700);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_motor(MotorConfig::default().with_duty_open(110))
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"));
//! assert!(config.validate().is_ok());
//! ```

use heapless::String as HString;

/// Maximum length for short config strings (hostnames, client IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (topics)
pub const MAX_LONG_STRING: usize = 128;

/// Maximum length of a JSON credential list
pub const MAX_CODE_LIST: usize = 1024;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

/// Type alias for JSON credential lists
pub type CodeListString = HString<MAX_CODE_LIST>;

// ============================================================================
// Helpers for creating heapless strings
// ============================================================================

/// Copy as much of `s` as fits into an `N`-byte heapless string.
///
/// Truncation happens on a character boundary, so the result is always
/// valid UTF-8.
pub fn bounded_string<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::<N>::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    bounded_string(s)
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    bounded_string(s)
}

// ============================================================================
// Errors
// ============================================================================

/// Reasons a configuration is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A steady-state duty exceeds the breakaway duty.
    DutyAboveBreakaway {
        /// Offending steady-state duty.
        duty: u8,
        /// Configured breakaway duty.
        breakaway: u8,
    },
    /// A steady-state duty of zero would never move the latch.
    ZeroDuty,
    /// The motor timeout is shorter than the breakaway + ramp profile.
    MotorTimeoutTooShort,
    /// Wiegand minimum frame length outside 1..=32.
    InvalidMinBits(u8),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::DutyAboveBreakaway { duty, breakaway } => write!(
                f,
                "duty cycle {} exceeds breakaway duty {}",
                duty, breakaway
            ),
            ConfigError::ZeroDuty => f.write_str("duty cycle must be non-zero"),
            ConfigError::MotorTimeoutTooShort => {
                f.write_str("motor timeout shorter than the start-up ramp")
            }
            ConfigError::InvalidMinBits(bits) => {
                write!(f, "minimum Wiegand frame length {} not in 1..=32", bits)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Motor duty and ramp tuning
    pub motor: MotorConfig,
    /// State machine timeouts
    pub timing: TimingConfig,
    /// Wiegand frame detection
    pub wiegand: WiegandConfig,
    /// MQTT topics and broker settings
    pub mqtt: MqttConfig,
    /// Owner and delivery credential lists
    pub credentials: CredentialConfig,
    /// Melody played when an opening is accepted
    pub selected_melody: ShortString,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            motor: MotorConfig::default(),
            timing: TimingConfig::default(),
            wiegand: WiegandConfig::default(),
            mqtt: MqttConfig::default(),
            credentials: CredentialConfig::default(),
            selected_melody: short_string("NOKIA_TUNE"),
        }
    }
}

impl Config {
    /// Set motor configuration
    pub fn with_motor(mut self, motor: MotorConfig) -> Self {
        self.motor = motor;
        self
    }

    /// Set timing configuration
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set Wiegand configuration
    pub fn with_wiegand(mut self, wiegand: WiegandConfig) -> Self {
        self.wiegand = wiegand;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set credential lists
    pub fn with_credentials(mut self, credentials: CredentialConfig) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the confirmation melody by name
    pub fn with_selected_melody(mut self, name: &str) -> Self {
        self.selected_melody = short_string(name);
        self
    }

    /// Check the configuration for values the controller can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.motor.validate()?;

        let settle = self.motor.full_power_window_ms as u64 + self.motor.ramp_window_ms as u64;
        if (self.timing.motor_timeout_ms as u64) <= settle {
            return Err(ConfigError::MotorTimeoutTooShort);
        }

        if !(1..=32).contains(&self.wiegand.min_bits) {
            return Err(ConfigError::InvalidMinBits(self.wiegand.min_bits));
        }

        Ok(())
    }
}

// ============================================================================
// Motor Config
// ============================================================================

/// Motor duty and soft-start tuning
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorConfig {
    /// Steady duty while opening (0-255)
    pub duty_open: u8,
    /// Steady duty while locking (0-255)
    pub duty_close: u8,
    /// Start-up burst duty, higher than either steady duty
    pub breakaway_duty: u8,
    /// Length of the breakaway burst in milliseconds
    pub full_power_window_ms: u32,
    /// Length of the linear decay to the steady duty in milliseconds
    pub ramp_window_ms: u32,
    /// PWM carrier frequency in Hz
    pub pwm_frequency_hz: u32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            duty_open: 120,
            duty_close: 90,
            breakaway_duty: 160,
            full_power_window_ms: 100,
            ramp_window_ms: 10,
            pwm_frequency_hz: 50_000,
        }
    }
}

impl MotorConfig {
    /// Set the opening duty
    pub fn with_duty_open(mut self, duty: u8) -> Self {
        self.duty_open = duty;
        self
    }

    /// Set the locking duty
    pub fn with_duty_close(mut self, duty: u8) -> Self {
        self.duty_close = duty;
        self
    }

    /// Set the breakaway duty
    pub fn with_breakaway_duty(mut self, duty: u8) -> Self {
        self.breakaway_duty = duty;
        self
    }

    /// Set the breakaway burst length
    pub fn with_full_power_window_ms(mut self, ms: u32) -> Self {
        self.full_power_window_ms = ms;
        self
    }

    /// Set the ramp-down length
    pub fn with_ramp_window_ms(mut self, ms: u32) -> Self {
        self.ramp_window_ms = ms;
        self
    }

    /// Set the PWM carrier frequency
    pub fn with_pwm_frequency_hz(mut self, hz: u32) -> Self {
        self.pwm_frequency_hz = hz;
        self
    }

    /// Check the duty values against each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for duty in [self.duty_open, self.duty_close] {
            if duty == 0 {
                return Err(ConfigError::ZeroDuty);
            }
            if duty > self.breakaway_duty {
                return Err(ConfigError::DutyAboveBreakaway {
                    duty,
                    breakaway: self.breakaway_duty,
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// State machine timeouts, all in milliseconds
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Delay between an accepted request and the motor starting
    pub opening_delay_ms: u32,
    /// How long a door stays released before re-locking
    pub open_dwell_ms: u32,
    /// Maximum duration of any motor move
    pub motor_timeout_ms: u32,
    /// No-switch duration that triggers the fail-safe re-lock
    pub inactivity_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            opening_delay_ms: 700,
            open_dwell_ms: 1000,
            motor_timeout_ms: 2000,
            inactivity_ms: 10_000,
        }
    }
}

impl TimingConfig {
    /// Set the pre-opening delay
    pub fn with_opening_delay_ms(mut self, ms: u32) -> Self {
        self.opening_delay_ms = ms;
        self
    }

    /// Set the open dwell time
    pub fn with_open_dwell_ms(mut self, ms: u32) -> Self {
        self.open_dwell_ms = ms;
        self
    }

    /// Set the motor timeout
    pub fn with_motor_timeout_ms(mut self, ms: u32) -> Self {
        self.motor_timeout_ms = ms;
        self
    }

    /// Set the inactivity fail-safe timeout
    pub fn with_inactivity_ms(mut self, ms: u32) -> Self {
        self.inactivity_ms = ms;
        self
    }
}

// ============================================================================
// Wiegand Config
// ============================================================================

/// Wiegand frame detection
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WiegandConfig {
    /// Silence after the last edge that ends a frame
    pub quiet_period_ms: u32,
    /// Shortest frame that is not treated as line noise
    pub min_bits: u8,
}

impl Default for WiegandConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 50,
            min_bits: 4,
        }
    }
}

impl WiegandConfig {
    /// Set the quiet period
    pub fn with_quiet_period_ms(mut self, ms: u32) -> Self {
        self.quiet_period_ms = ms;
        self
    }

    /// Set the minimum frame length
    pub fn with_min_bits(mut self, bits: u8) -> Self {
        self.min_bits = bits;
        self
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MqttConfig {
    /// Broker hostname or IP (empty = MQTT disabled)
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Client ID
    pub client_id: ShortString,
    /// Topic prefix for all pub/sub (e.g., "paketkasten" -> "paketkasten/state")
    pub topic_prefix: ShortString,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Minimum time between reconnect attempts in milliseconds
    pub reconnect_interval_ms: u32,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: ShortString::new(),
            port: 1883,
            client_id: short_string("Paketkasten"),
            topic_prefix: short_string("paketkasten"),
            username: ShortString::new(),
            password: ShortString::new(),
            reconnect_interval_ms: 5000,
        }
    }
}

impl MqttConfig {
    /// Set the broker host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        self.client_id = short_string(id);
        self
    }

    /// Set the topic prefix
    pub fn with_topic_prefix(mut self, prefix: &str) -> Self {
        self.topic_prefix = short_string(prefix);
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = short_string(username);
        self.password = short_string(password);
        self
    }

    /// Set the reconnect interval
    pub fn with_reconnect_interval_ms(mut self, ms: u32) -> Self {
        self.reconnect_interval_ms = ms;
        self
    }

    /// Build a topic string with the configured prefix
    pub fn topic(&self, suffix: &str) -> LongString {
        let mut topic = LongString::new();
        let _ = topic.push_str(self.topic_prefix.as_str());
        let _ = topic.push('/');
        let _ = topic.push_str(suffix);
        topic
    }

    /// True when a broker is configured
    pub fn is_enabled(&self) -> bool {
        !self.host.is_empty()
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }
}

// ============================================================================
// Credential Config
// ============================================================================

/// Owner and delivery credential lists as JSON text.
///
/// Each list is an array of `{"code": "<hex>", "label": "<name>"}` objects.
/// Owner codes open the whole box, delivery codes only the parcel door.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CredentialConfig {
    /// Owner list (opens the mail door)
    pub owner_codes: CodeListString,
    /// Delivery list (opens the parcel door)
    pub delivery_codes: CodeListString,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            owner_codes: bounded_string("[]"),
            delivery_codes: bounded_string("[]"),
        }
    }
}

impl CredentialConfig {
    /// Set the owner list
    pub fn with_owner_codes(mut self, json: &str) -> Self {
        self.owner_codes = bounded_string(json);
        self
    }

    /// Set the delivery list
    pub fn with_delivery_codes(mut self, json: &str) -> Self {
        self.delivery_codes = bounded_string(json);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.motor.duty_open, 120);
        assert_eq!(config.motor.duty_close, 90);
        assert_eq!(config.timing.motor_timeout_ms, 2000);
        assert_eq!(config.wiegand.quiet_period_ms, 50);
        assert_eq!(config.selected_melody.as_str(), "NOKIA_TUNE");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn mqtt_topic_building() {
        let mqtt = MqttConfig::default();
        assert_eq!(mqtt.topic("command").as_str(), "paketkasten/command");

        let mqtt = mqtt.with_topic_prefix("home/box");
        assert_eq!(mqtt.topic("state").as_str(), "home/box/state");
    }

    #[test]
    fn mqtt_enabled_and_auth_detection() {
        let mqtt = MqttConfig::default();
        assert!(!mqtt.is_enabled());
        assert!(!mqtt.has_auth());

        let mqtt = mqtt.with_host("broker.local").with_auth("user", "pass");
        assert!(mqtt.is_enabled());
        assert!(mqtt.has_auth());
    }

    #[test]
    fn duty_above_breakaway_rejected() {
        let config =
            Config::default().with_motor(MotorConfig::default().with_duty_open(200));
        assert_eq!(
            config.validate(),
            Err(ConfigError::DutyAboveBreakaway {
                duty: 200,
                breakaway: 160
            })
        );
    }

    #[test]
    fn zero_duty_rejected() {
        let motor = MotorConfig::default().with_duty_close(0);
        assert_eq!(motor.validate(), Err(ConfigError::ZeroDuty));
    }

    #[test]
    fn motor_timeout_shorter_than_ramp_rejected() {
        let config =
            Config::default().with_timing(TimingConfig::default().with_motor_timeout_ms(100));
        assert_eq!(config.validate(), Err(ConfigError::MotorTimeoutTooShort));
    }

    #[test]
    fn invalid_min_bits_rejected() {
        let config = Config::default().with_wiegand(WiegandConfig::default().with_min_bits(40));
        assert_eq!(config.validate(), Err(ConfigError::InvalidMinBits(40)));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::DutyAboveBreakaway {
            duty: 200,
            breakaway: 160,
        };
        assert_eq!(err.to_string(), "duty cycle 200 exceeds breakaway duty 160");
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 17 four-byte characters: only 16 fit in 64 bytes
        let input = "\u{1F4EC}".repeat(17);
        let s = short_string(&input);
        assert_eq!(s.len(), 64);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[test]
    fn credential_lists_default_empty_arrays() {
        let creds = CredentialConfig::default();
        assert_eq!(creds.owner_codes.as_str(), "[]");
        assert_eq!(creds.delivery_codes.as_str(), "[]");

        let creds = creds.with_owner_codes(r#"[{"code":"1A","label":"me"}]"#);
        assert!(creds.owner_codes.contains("1A"));
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_timing(TimingConfig::default().with_open_dwell_ms(3000))
            .with_selected_melody("TETRIS");
        assert_eq!(config.timing.open_dwell_ms, 3000);
        assert_eq!(config.selected_melody.as_str(), "TETRIS");
    }
}
