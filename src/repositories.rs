use crate::errors::{AppError, ResultExt};
use crate::models::{
    Address, CreateAddressParams, CreateEnrollmentParams, Enrollment, EnrollmentWithAddress,
    UpdateAddressParams, UpdateEnrollmentParams,
};
use async_trait::async_trait;
use sqlx::PgPool;

/// Persistence of enrollments, keyed by the owning user.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_with_address_by_user_id(
        &self,
        user_id: i32,
    ) -> Result<Option<EnrollmentWithAddress>, AppError>;

    /// Creates the user's enrollment from `create`, or applies `update` to the existing one.
    async fn upsert(
        &self,
        user_id: i32,
        create: &CreateEnrollmentParams,
        update: &UpdateEnrollmentParams,
    ) -> Result<Enrollment, AppError>;
}

/// Persistence of addresses, keyed by the owning enrollment.
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn upsert(
        &self,
        enrollment_id: i32,
        create: &CreateAddressParams,
        update: &UpdateAddressParams,
    ) -> Result<Address, AppError>;
}

pub struct PgEnrollmentRepository {
    pool: PgPool,
}

impl PgEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for PgEnrollmentRepository {
    async fn find_with_address_by_user_id(
        &self,
        user_id: i32,
    ) -> Result<Option<EnrollmentWithAddress>, AppError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load enrollment for user {}", user_id))?;

        let Some(enrollment) = enrollment else {
            return Ok(None);
        };

        let addresses = sqlx::query_as::<_, Address>(
            "SELECT * FROM addresses WHERE enrollment_id = $1 ORDER BY id",
        )
        .bind(enrollment.id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load addresses for enrollment {}", enrollment.id))?;

        Ok(Some(EnrollmentWithAddress {
            enrollment,
            addresses,
        }))
    }

    async fn upsert(
        &self,
        user_id: i32,
        create: &CreateEnrollmentParams,
        update: &UpdateEnrollmentParams,
    ) -> Result<Enrollment, AppError> {
        // $2..$5 seed a new row; $6..$9 overwrite an existing one
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (user_id, name, cpf, birthday, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now(), now())
            ON CONFLICT (user_id) DO UPDATE SET
                name = $6,
                cpf = $7,
                birthday = $8,
                phone = $9,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&create.name)
        .bind(&create.cpf)
        .bind(create.birthday)
        .bind(&create.phone)
        .bind(&update.name)
        .bind(&update.cpf)
        .bind(update.birthday)
        .bind(&update.phone)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert enrollment for user {}", user_id))?;

        tracing::debug!("Upserted enrollment {} for user {}", enrollment.id, user_id);
        Ok(enrollment)
    }
}

pub struct PgAddressRepository {
    pool: PgPool,
}

impl PgAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn upsert(
        &self,
        enrollment_id: i32,
        create: &CreateAddressParams,
        update: &UpdateAddressParams,
    ) -> Result<Address, AppError> {
        // An update without address_detail ($16 false) keeps the stored one
        let address = sqlx::query_as::<_, Address>(
            r#"
            INSERT INTO addresses (
                enrollment_id, cep, street, complement, neighborhood,
                city, state, address_detail, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), now())
            ON CONFLICT (enrollment_id) DO UPDATE SET
                cep = $9,
                street = $10,
                complement = $11,
                neighborhood = $12,
                city = $13,
                state = $14,
                address_detail = CASE WHEN $16 THEN $15 ELSE addresses.address_detail END,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(enrollment_id)
        .bind(&create.cep)
        .bind(&create.street)
        .bind(&create.complement)
        .bind(&create.neighborhood)
        .bind(&create.city)
        .bind(&create.state)
        .bind(create.address_detail_value())
        .bind(&update.cep)
        .bind(&update.street)
        .bind(&update.complement)
        .bind(&update.neighborhood)
        .bind(&update.city)
        .bind(&update.state)
        .bind(update.address_detail_value())
        .bind(update.has_address_detail())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert address for enrollment {}", enrollment_id))?;

        tracing::debug!(
            "Upserted address {} for enrollment {}",
            address.id,
            enrollment_id
        );
        Ok(address)
    }
}
