use rand::rngs::OsRng;
use rand::Rng;
use time::{Duration, OffsetDateTime};

pub const OTP_TTL_MINUTES: i64 = 10;

/// Six fixed-width decimal digits from the OS CSPRNG. Never starts
/// with zero, so the string form is always exactly six characters.
pub fn generate_otp() -> String {
    OsRng.gen_range(100_000..=999_999).to_string()
}

pub fn otp_expiry() -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::minutes(OTP_TTL_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_decimal_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(otp.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn expiry_is_ten_minutes_out() {
        let before = OffsetDateTime::now_utc();
        let expiry = otp_expiry();
        let delta = expiry - before;
        assert!(delta >= Duration::minutes(OTP_TTL_MINUTES) - Duration::seconds(1));
        assert!(delta <= Duration::minutes(OTP_TTL_MINUTES) + Duration::seconds(1));
    }
}
