use crate::errors::{AppError, ResultExt};
use crate::models::*;
use crate::postal_client::PostalLookupClient;
use crate::repositories::{AddressRepository, EnrollmentRepository};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Leading integer prefix as `parseInt` reads it: whitespace, optional sign, then
/// either a `0x` prefix followed by a hex digit, or a decimal digit.
///
/// The whitespace set is TAB, VT, FF, SP, NBSP, BOM, Zs, LF, CR, LS and PS.
static INTEGER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[\t\x0B\x0C\n\r\u{A0}\u{FEFF}\u{2028}\u{2029}\p{Zs}]*[+-]?(?:0[xX][0-9a-fA-F]|0(?:[^xX]|$)|[1-9])",
    )
    .expect("integer prefix regex is valid")
});

/// Length of a CEP, in UTF-16 code units.
pub const CEP_LENGTH: usize = 8;

/// Shape check applied to CEPs submitted for lookup.
///
/// Only requires eight UTF-16 units that start with an integer, so values such
/// as `"1234abcd"` are accepted and left for the upstream to reject.
pub fn is_valid_cep(cep: &str) -> bool {
    cep.encode_utf16().count() == CEP_LENGTH && INTEGER_PREFIX.is_match(cep)
}

pub struct EnrollmentService {
    enrollments: Arc<dyn EnrollmentRepository>,
    addresses: Arc<dyn AddressRepository>,
    postal_client: PostalLookupClient,
}

impl EnrollmentService {
    pub fn new(
        enrollments: Arc<dyn EnrollmentRepository>,
        addresses: Arc<dyn AddressRepository>,
        postal_client: PostalLookupClient,
    ) -> Self {
        Self {
            enrollments,
            addresses,
            postal_client,
        }
    }

    /// Resolve a CEP into the reduced address shown on the enrollment form.
    pub async fn get_address_from_cep(&self, cep: &str) -> Result<AddressLookupResult, AppError> {
        if !is_valid_cep(cep) {
            tracing::info!("Rejected malformed CEP: {:?}", cep);
            return Err(AppError::invalid_data(["Unprocessable Entity"]));
        }

        let data = self
            .postal_client
            .lookup(cep)
            .await?
            .ok_or_else(AppError::not_found)?;

        Ok(data.into())
    }

    /// Load the user's enrollment and, if any, its address.
    ///
    /// Addresses are stored one per enrollment; should more rows exist, only the
    /// first (lowest id) is returned.
    pub async fn get_one_with_address_by_user_id(
        &self,
        user_id: i32,
    ) -> Result<EnrollmentWithAddressResponse, AppError> {
        let EnrollmentWithAddress {
            enrollment,
            addresses,
        } = self
            .enrollments
            .find_with_address_by_user_id(user_id)
            .await?
            .ok_or_else(AppError::not_found)?;

        let address = addresses.into_iter().next().map(AddressResponse::from);

        Ok(EnrollmentWithAddressResponse::new(enrollment, address))
    }

    /// Create the user's enrollment and address, or overwrite the existing ones.
    ///
    /// The CEP is checked upstream before anything is written; the enrollment is
    /// stored first because the address is keyed by its id.
    pub async fn create_or_update_enrollment_with_address(
        &self,
        params: CreateOrUpdateEnrollmentWithAddress,
    ) -> Result<(), AppError> {
        let CreateOrUpdateEnrollmentWithAddress {
            enrollment,
            address,
        } = params;

        if self.postal_client.lookup(&address.cep).await?.is_none() {
            tracing::warn!(
                "Refusing enrollment for user {}: CEP {} not found",
                enrollment.user_id,
                address.cep
            );
            return Err(AppError::not_found());
        }

        let update = UpdateEnrollmentParams::from(&enrollment);
        let stored = self
            .enrollments
            .upsert(enrollment.user_id, &enrollment, &update)
            .await?;

        self.addresses
            .upsert(stored.id, &address, &address)
            .await
            .context(format!("Storing address for enrollment {}", stored.id))?;

        tracing::info!(
            "Stored enrollment {} with address for user {}",
            stored.id,
            enrollment.user_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cep_shape() {
        assert!(is_valid_cep("01310100"));
        assert!(is_valid_cep("1234abcd"));
        assert!(is_valid_cep(" 1234567"));
        assert!(is_valid_cep("-1234567"));
        assert!(is_valid_cep("\u{A0}1234567"));
        assert!(is_valid_cep("0x1fzzzz"));
        assert!(is_valid_cep("0abcdefg"));

        assert!(!is_valid_cep("0131010"));
        assert!(!is_valid_cep("013101000"));
        assert!(!is_valid_cep("abcdefgh"));
        assert!(!is_valid_cep("+-123456"));
        assert!(!is_valid_cep(""));
        assert!(!is_valid_cep("0xghijkl"));
        assert!(!is_valid_cep("-0Xzzzzz"));
        assert!(!is_valid_cep("\u{85}1234567"));
        assert!(!is_valid_cep("1234567\u{1F600}"));
    }

    #[test]
    fn test_cep_length_counts_utf16_units() {
        // Two astral characters are four UTF-16 units
        assert!(is_valid_cep("1234\u{1F600}\u{1F600}"));
        assert!(!is_valid_cep("123456\u{1F600}"));
    }
}
