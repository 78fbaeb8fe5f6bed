//! Seed data: the default accounts and a small demo movement history.

use chipping_area::create_area;
use chipping_area_models::AreaDraft;
use chipping_database::queries::{self, NewAnimal};
use chipping_database::store::SqlStore;
use chipping_database_models::{NewAccount, Role};
use chipping_geometry_models::GeoPoint;
use chrono::{DateTime, TimeZone as _, Utc};

/// Password shared by the default accounts.
pub const DEFAULT_PASSWORD: &str = "qwerty123";

/// A default account to seed.
struct SeedAccount {
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    role: Role,
}

const DEFAULT_ACCOUNTS: &[SeedAccount] = &[
    SeedAccount {
        first_name: "adminFirstName",
        last_name: "adminLastName",
        email: "admin@simbirsoft.com",
        role: Role::Admin,
    },
    SeedAccount {
        first_name: "chipperFirstName",
        last_name: "chipperLastName",
        email: "chipper@simbirsoft.com",
        role: Role::Chipper,
    },
    SeedAccount {
        first_name: "userFirstName",
        last_name: "userLastName",
        email: "user@simbirsoft.com",
        role: Role::User,
    },
];

/// Creates the admin, chipper, and user accounts unless their emails are
/// already taken. Returns how many were inserted.
///
/// # Errors
///
/// Returns an error if hashing or a database write fails.
pub async fn seed_accounts(
    store: &SqlStore,
    salt: &str,
) -> Result<u32, Box<dyn std::error::Error>> {
    let mut inserted = 0u32;

    for seed in DEFAULT_ACCOUNTS {
        let account = NewAccount {
            first_name: seed.first_name.to_string(),
            last_name: seed.last_name.to_string(),
            email: seed.email.to_string(),
            password_hash: chipping_server::auth::hash_password(DEFAULT_PASSWORD, salt)?,
            role: seed.role,
        };

        match queries::insert_account(store.db(), &account).await? {
            Some(id) => {
                log::info!("Created {} account {} (id {id})", seed.role, seed.email);
                inserted += 1;
            }
            None => log::info!("Account {} already exists, skipping", seed.email),
        }
    }

    Ok(inserted)
}

/// Demo animal: type label, chipping point, chipping time, and visits.
struct DemoAnimal {
    label: &'static str,
    chipped_at: (f64, f64),
    chipped_on: u32,
    visits: &'static [((f64, f64), u32)],
}

const DEMO_ANIMALS: &[DemoAnimal] = &[
    DemoAnimal {
        label: "fox",
        chipped_at: (55.1, 37.1),
        chipped_on: 1,
        visits: &[((55.2, 37.2), 5), ((56.5, 38.5), 20)],
    },
    DemoAnimal {
        label: "fox",
        chipped_at: (56.5, 38.5),
        chipped_on: 2,
        visits: &[((55.3, 37.3), 12)],
    },
    DemoAnimal {
        label: "hare",
        chipped_at: (55.4, 37.4),
        chipped_on: 3,
        visits: &[],
    },
    DemoAnimal {
        label: "hare",
        chipped_at: (55.5, 37.5),
        chipped_on: 15,
        visits: &[((55.6, 37.6), 18)],
    },
];

fn demo_day(day: u32) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    Utc.with_ymd_and_hms(2023, 3, day, 12, 0, 0)
        .single()
        .ok_or_else(|| format!("Invalid demo day {day}").into())
}

/// Inserts a demo area and a few animals moving in and out of it during
/// March 2023.
///
/// Expects the default chipper account to exist.
///
/// # Errors
///
/// Returns an error if the chipper account is missing, the demo area
/// conflicts with an existing one, or a database write fails.
pub async fn seed_demo(store: &SqlStore) -> Result<(), Box<dyn std::error::Error>> {
    let db = store.db();

    let chipper = queries::get_account_by_email(db, "chipper@simbirsoft.com")
        .await?
        .ok_or("Run `seed-accounts` first: the default chipper account is missing")?;

    let area = create_area(
        store,
        &AreaDraft::new(
            "Demo reserve",
            vec![
                GeoPoint::new(55.0, 37.0),
                GeoPoint::new(55.0, 38.0),
                GeoPoint::new(56.0, 38.0),
                GeoPoint::new(56.0, 37.0),
            ],
        ),
    )
    .await?;
    log::info!("Created demo area {} ({})", area.name, area.id);

    for demo in DEMO_ANIMALS {
        let type_id = queries::upsert_animal_type(db, demo.label).await?;
        let (lat, lng) = demo.chipped_at;
        let chipping_location_id =
            queries::upsert_location_point(db, GeoPoint::checked(lat, lng)?).await?;

        let animal_id = queries::insert_animal(
            db,
            &NewAnimal {
                weight: 5.0,
                length: 0.8,
                height: 0.4,
                gender: "OTHER".to_string(),
                chipped_at: demo_day(demo.chipped_on)?,
                chipper_id: chipper.id,
                chipping_location_id,
            },
        )
        .await?;
        queries::assign_animal_type(db, animal_id, type_id).await?;

        for &((lat, lng), day) in demo.visits {
            let point_id = queries::upsert_location_point(db, GeoPoint::checked(lat, lng)?).await?;
            queries::insert_visit(db, animal_id, point_id, demo_day(day)?).await?;
        }

        log::info!(
            "Created demo {} {animal_id} with {} visits",
            demo.label,
            demo.visits.len()
        );
    }

    Ok(())
}
