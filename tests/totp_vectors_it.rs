// crates.io
use time::OffsetDateTime;
// self
use hmrc_token_broker::{
	otp::{HmacSha512Hasher, SharedSecret, TotpGenerator, TotpSettings, UnpaddedHmacSha512Hasher},
	service::{Base32TotpService, TotpService},
};

const SHARED_SECRET: &str = "GQ2TCMRSGQ2TELJRMRQTQLJUMI3DSLJYMYZWILJWGUYWMNBSMM3DSODDGY2DKMJSGI2DKMRNGFSGCOBNGRRDMOJNHBTDGZBNGY2TCZQ";
const VECTORS: [(i64, &str); 3] =
	[(59, "29303361"), (1_234_567_890, "84853786"), (2_000_000_000, "98909859")];

fn at(seconds: i64) -> OffsetDateTime {
	OffsetDateTime::from_unix_timestamp(seconds).expect("Vector timestamps should be in range.")
}

#[test]
fn base32_service_matches_reference_vectors() {
	let service =
		Base32TotpService::new(TotpSettings::default()).expect("Default settings should be valid.");

	for (seconds, expected) in VECTORS {
		assert_eq!(
			service.generate_at(SHARED_SECRET, at(seconds)).expect("Generation should succeed."),
			expected,
			"Code mismatch at {seconds}s."
		);
	}
}

#[test]
fn padded_and_unpadded_hashers_agree_on_a_full_length_secret() {
	let secret = SharedSecret::from_base32(SHARED_SECRET).expect("Vector secret should decode.");
	let padded = TotpGenerator::new(HmacSha512Hasher, TotpSettings::default())
		.expect("Default settings should be valid.");
	let unpadded = TotpGenerator::new(UnpaddedHmacSha512Hasher, TotpSettings::default())
		.expect("Default settings should be valid.");

	assert_eq!(secret.as_bytes().len(), 64);

	for (seconds, expected) in VECTORS {
		assert_eq!(padded.generate(&secret, at(seconds)).expect("Generation should succeed."), expected);
		assert_eq!(
			unpadded.generate(&secret, at(seconds)).expect("Generation should succeed."),
			expected
		);
	}
}

#[test]
fn generation_is_deterministic() {
	let service =
		Base32TotpService::new(TotpSettings::default()).expect("Default settings should be valid.");
	let instant = at(1_700_000_000);
	let first = service.generate_at(SHARED_SECRET, instant).expect("Generation should succeed.");
	let second = service.generate_at(SHARED_SECRET, instant).expect("Generation should succeed.");

	assert_eq!(first, second);
	assert_eq!(first.len(), 8);
}

#[test]
fn current_instant_codes_are_well_formed() {
	let service =
		Base32TotpService::new(TotpSettings::default()).expect("Default settings should be valid.");
	let code = service.generate(SHARED_SECRET).expect("Generation should succeed.");

	assert_eq!(code.len(), 8);
	assert!(code.bytes().all(|b| b.is_ascii_digit()));
}
