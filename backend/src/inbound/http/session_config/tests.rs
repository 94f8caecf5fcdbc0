//! Unit tests for session configuration parsing.

use super::*;
use mockable::{DefaultEnv, MockEnv};
use rstest::rstest;
use std::collections::HashMap;
use uuid::Uuid;

struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> Self {
        let path = std::env::temp_dir().join(format!("icare-session-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'k'; len]).expect("write key file");
        Self { path }
    }

    fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key_file: &TempKeyFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key_file.path_str()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

#[rstest]
fn release_accepts_complete_configuration() {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let settings = session_settings_from_env(&mock_env(release_vars(&key_file)), BuildMode::Release)
        .expect("valid settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(#[case] missing: &'static str) {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.remove(missing);

    let error = session_settings_from_env(&mock_env(vars), BuildMode::Release)
        .err()
        .expect("missing toggle rejected");
    assert!(matches!(error, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(SAMESITE_ENV, "sideways")]
fn release_rejects_garbage(#[case] name: &'static str, #[case] value: &str) {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.insert(name, value.to_owned());

    let error = session_settings_from_env(&mock_env(vars), BuildMode::Release)
        .err()
        .expect("garbage rejected");
    assert!(matches!(error, SessionConfigError::InvalidEnv { name: got, .. } if got == name));
}

#[rstest]
fn release_rejects_ephemeral_keys() {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());

    let error = session_settings_from_env(&mock_env(vars), BuildMode::Release)
        .err()
        .expect("ephemeral rejected");
    assert!(matches!(error, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_rejects_short_keys() {
    let key_file = TempKeyFile::new(16);
    let error = session_settings_from_env(&mock_env(release_vars(&key_file)), BuildMode::Release)
        .err()
        .expect("short key rejected");
    assert!(matches!(error, SessionConfigError::KeyTooShort { length: 16, .. }));
}

#[rstest]
fn release_rejects_insecure_same_site_none() {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());

    let error = session_settings_from_env(&mock_env(vars), BuildMode::Release)
        .err()
        .expect("insecure None rejected");
    assert!(matches!(error, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn debug_falls_back_to_defaults() {
    let vars = HashMap::from([
        (SAMESITE_ENV, "unexpected".to_owned()),
        (KEY_FILE_ENV, "/nonexistent/icare-session-key".to_owned()),
    ]);
    let settings = session_settings_from_env(&mock_env(vars), BuildMode::Debug)
        .expect("debug tolerates gaps");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_replaces_keys_too_short_to_derive() {
    let key_file = TempKeyFile::new(8);
    let vars = HashMap::from([(KEY_FILE_ENV, key_file.path_str())]);
    let settings = session_settings_from_env(&mock_env(vars), BuildMode::Debug)
        .expect("debug generates a key");
    assert_eq!(settings.key.master().len(), 64);
}

#[rstest]
fn debug_loads_from_the_process_environment() {
    let settings = session_settings_from_env(&DefaultEnv::new(), BuildMode::Debug)
        .expect("debug tolerates the process environment");
    assert_eq!(settings.key.master().len(), 64);
}

#[rstest]
fn fingerprints_are_short_stable_hex() {
    let key = Key::derive_from(&[b'a'; 64]);
    let fingerprint = key_fingerprint(&key);
    assert_eq!(fingerprint.len(), FINGERPRINT_BYTES * 2);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(fingerprint, key_fingerprint(&key));
    assert_ne!(fingerprint, key_fingerprint(&Key::derive_from(&[b'b'; 64])));
}
