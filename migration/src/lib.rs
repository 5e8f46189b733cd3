pub use sea_orm_migration::prelude::*;

mod m20251202_000001_create_units;
mod m20251202_000002_create_users;
mod m20251202_000003_create_active_sessions;
mod m20251202_000004_create_password_reset_otps;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251202_000001_create_units::Migration),
            Box::new(m20251202_000002_create_users::Migration),
            Box::new(m20251202_000003_create_active_sessions::Migration),
            Box::new(m20251202_000004_create_password_reset_otps::Migration),
        ]
    }
}
