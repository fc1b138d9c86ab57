use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

// ============ Database Models ============

/// A user's enrollment record. Each user owns at most one.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// Unique identifier for the enrollment.
    pub id: i32,
    /// Full name of the enrolled person.
    pub name: String,
    /// CPF document number.
    pub cpf: String,
    /// Date of birth.
    pub birthday: DateTime<Utc>,
    /// Contact phone.
    pub phone: String,
    /// Owning user; unique across enrollments.
    pub user_id: i32,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: DateTime<Utc>,
}

/// Postal address attached to an enrollment.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Unique identifier for the address.
    pub id: i32,
    /// Postal code (CEP), 8 digits.
    pub cep: String,
    /// Street name.
    pub street: String,
    /// Complement (apartment, suite, etc.).
    pub complement: Option<String>,
    /// Neighborhood.
    pub neighborhood: String,
    /// City.
    pub city: String,
    /// State (UF).
    pub state: String,
    /// Free-form detail supplied by the user.
    pub address_detail: Option<String>,
    /// Owning enrollment.
    pub enrollment_id: i32,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: DateTime<Utc>,
}

/// An enrollment joined with its address rows, ordered by address id.
#[derive(Debug, Clone)]
pub struct EnrollmentWithAddress {
    pub enrollment: Enrollment,
    pub addresses: Vec<Address>,
}

// ============ Write Payloads ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnrollmentParams {
    pub name: String,
    pub cpf: String,
    pub birthday: DateTime<Utc>,
    pub phone: String,
    pub user_id: i32,
}

/// Enrollment fields applied when the user already has an enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnrollmentParams {
    pub name: String,
    pub cpf: String,
    pub birthday: DateTime<Utc>,
    pub phone: String,
}

impl From<&CreateEnrollmentParams> for UpdateEnrollmentParams {
    fn from(params: &CreateEnrollmentParams) -> Self {
        Self {
            name: params.name.clone(),
            cpf: params.cpf.clone(),
            birthday: params.birthday,
            phone: params.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressParams {
    pub cep: String,
    pub street: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    /// `None` when the field is absent, which leaves a stored detail untouched on
    /// update. `Some(None)` (JSON `null`) and `Some(Some(""))` are written as sent.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub address_detail: Option<Option<String>>,
}

impl CreateAddressParams {
    /// The detail value to store, `None` for both absent and `null`.
    pub fn address_detail_value(&self) -> Option<&str> {
        self.address_detail.as_ref().and_then(|detail| detail.as_deref())
    }

    /// Whether the payload carried `addressDetail` at all.
    pub fn has_address_detail(&self) -> bool {
        self.address_detail.is_some()
    }
}

pub type UpdateAddressParams = CreateAddressParams;

/// Marks a field that appeared in the payload, so `null` stays distinct from absent.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Body of `POST /enrollments`. The owning user comes from the request identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequest {
    pub name: String,
    pub cpf: String,
    pub birthday: DateTime<Utc>,
    pub phone: String,
    pub address: CreateAddressParams,
}

impl EnrollmentRequest {
    pub fn for_user(self, user_id: i32) -> CreateOrUpdateEnrollmentWithAddress {
        CreateOrUpdateEnrollmentWithAddress {
            enrollment: CreateEnrollmentParams {
                name: self.name,
                cpf: self.cpf,
                birthday: self.birthday,
                phone: self.phone,
                user_id,
            },
            address: self.address,
        }
    }
}

/// Enrollment fields together with the nested address to store alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrUpdateEnrollmentWithAddress {
    #[serde(flatten)]
    pub enrollment: CreateEnrollmentParams,
    pub address: CreateAddressParams,
}

// ============ Read Projections ============

/// Address as exposed to callers: no audit timestamps, no back-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub id: i32,
    pub cep: String,
    pub street: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub address_detail: Option<String>,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            cep: address.cep,
            street: address.street,
            complement: address.complement,
            neighborhood: address.neighborhood,
            city: address.city,
            state: address.state,
            address_detail: address.address_detail,
        }
    }
}

/// Enrollment as exposed to callers: no owning user, no audit timestamps.
///
/// `address` is omitted from the JSON entirely when the enrollment has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentWithAddressResponse {
    pub id: i32,
    pub name: String,
    pub cpf: String,
    pub birthday: DateTime<Utc>,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressResponse>,
}

impl EnrollmentWithAddressResponse {
    pub fn new(enrollment: Enrollment, address: Option<AddressResponse>) -> Self {
        Self {
            id: enrollment.id,
            name: enrollment.name,
            cpf: enrollment.cpf,
            birthday: enrollment.birthday,
            phone: enrollment.phone,
            address,
        }
    }
}

/// Reduced address returned by the CEP lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLookupResult {
    #[serde(rename = "logradouro")]
    pub street: String,
    #[serde(rename = "complemento")]
    pub complement: String,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "uf")]
    pub state: String,
}

/// Query parameters for `GET /enrollments/cep`.
#[derive(Debug, Deserialize)]
pub struct CepQueryParams {
    #[serde(default)]
    pub cep: String,
}
