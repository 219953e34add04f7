//! Shop profile, receipt message template and subscription gating.
//!
//! Both the profile and the template are id = 1 singletons seeded by the
//! migrations. The profile's `active_until` timestamp gates order
//! creation; renewal goes through a WhatsApp chat with the app admin.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::DbState;
use crate::error::StoreError;
use crate::models::{MessageTemplate, Profile};

/// WhatsApp number of the app administrator handling subscription
/// renewals.
const ADMIN_WHATSAPP: &str = "62895324443540";

/// Input for updating the shop profile. `active_until` is managed by the
/// admin side and deliberately absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    pub laundry_name: String,
    pub address: String,
    pub phone: String,
}

/// Fetch the shop profile.
pub fn get_profile(db: &DbState) -> Result<Profile, StoreError> {
    let conn = db.lock()?;
    let (laundry_name, address, phone, active_until): (String, String, String, String) = conn
        .query_row(
            "SELECT laundry_name, address, phone, active_until FROM profiles WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;
    let active_until = parse_timestamp(&active_until)?;
    Ok(Profile {
        laundry_name,
        address,
        phone,
        active_until,
    })
}

/// Update the shop's own details.
pub fn update_profile(db: &DbState, input: &ProfileInput) -> Result<Profile, StoreError> {
    if input.laundry_name.trim().is_empty() {
        return Err(StoreError::validation("laundry name must not be empty"));
    }
    {
        let conn = db.lock()?;
        conn.execute(
            "UPDATE profiles SET laundry_name = ?1, address = ?2, phone = ?3 WHERE id = 1",
            params![
                input.laundry_name.trim(),
                input.address.trim(),
                input.phone.trim()
            ],
        )?;
    }
    info!("Updated shop profile '{}'", input.laundry_name.trim());
    get_profile(db)
}

/// Set the subscription expiry. Called after a confirmed renewal.
pub fn set_active_until(db: &DbState, active_until: DateTime<Utc>) -> Result<(), StoreError> {
    let conn = db.lock()?;
    conn.execute(
        "UPDATE profiles SET active_until = ?1 WHERE id = 1",
        params![active_until.to_rfc3339()],
    )?;
    info!("Subscription active until {}", active_until.to_rfc3339());
    Ok(())
}

/// Fetch the receipt message template.
pub fn get_template(db: &DbState) -> Result<MessageTemplate, StoreError> {
    let conn = db.lock()?;
    let template = conn.query_row(
        "SELECT header, footer FROM message_templates WHERE id = 1",
        [],
        |row| {
            Ok(MessageTemplate {
                header: row.get(0)?,
                footer: row.get(1)?,
            })
        },
    )?;
    Ok(template)
}

/// Update the receipt message template.
pub fn update_template(db: &DbState, template: &MessageTemplate) -> Result<(), StoreError> {
    let conn = db.lock()?;
    conn.execute(
        "UPDATE message_templates SET header = ?1, footer = ?2 WHERE id = 1",
        params![template.header, template.footer],
    )?;
    Ok(())
}

/// Whether the subscription is active at instant `now`.
pub fn subscription_active(profile: &Profile, now: DateTime<Utc>) -> bool {
    profile.active_until > now
}

/// Whole days remaining on the subscription, rounded up; 0 when expired.
pub fn days_left(profile: &Profile, now: DateTime<Utc>) -> i64 {
    let secs = (profile.active_until - now).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + 86_399) / 86_400
}

/// Assert the subscription is active, for use before gated operations.
pub fn ensure_subscription_active(db: &DbState, now: DateTime<Utc>) -> Result<(), StoreError> {
    let profile = get_profile(db)?;
    if subscription_active(&profile, now) {
        Ok(())
    } else {
        Err(StoreError::SubscriptionExpired {
            active_until: profile.active_until,
        })
    }
}

/// wa.me link opening a renewal chat with the admin, pre-filled with the
/// shop name and current expiry.
pub fn renewal_link(profile: &Profile) -> String {
    let message = format!(
        "Halo admin 👋\n\nSaya ingin memperpanjang langganan aplikasi laundry.\n\nNama Laundry: {}\nMasa aktif sebelumnya: {}",
        profile.laundry_name,
        profile.active_until.format("%Y-%m-%d")
    );
    format!(
        "https://wa.me/{ADMIN_WHATSAPP}?text={}",
        urlencoding::encode(&message)
    )
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::validation(format!("bad timestamp '{raw}': {e}")))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use chrono::Duration;

    #[test]
    fn fresh_profile_is_expired() {
        let db = test_db();
        let profile = get_profile(&db).unwrap();
        assert!(!subscription_active(&profile, Utc::now()));
        assert_eq!(days_left(&profile, Utc::now()), 0);
    }

    #[test]
    fn profile_update_round_trip() {
        let db = test_db();
        let updated = update_profile(
            &db,
            &ProfileInput {
                laundry_name: "Laundry Berkah".into(),
                address: "Jl. Melati 12".into(),
                phone: "081234567890".into(),
            },
        )
        .unwrap();
        assert_eq!(updated.laundry_name, "Laundry Berkah");
        assert_eq!(get_profile(&db).unwrap().address, "Jl. Melati 12");
    }

    #[test]
    fn days_left_rounds_up() {
        let now = Utc::now();
        let profile = Profile {
            laundry_name: String::new(),
            address: String::new(),
            phone: String::new(),
            active_until: now + Duration::hours(25),
        };
        assert_eq!(days_left(&profile, now), 2);
        assert!(subscription_active(&profile, now));
    }

    #[test]
    fn gate_blocks_expired_subscription() {
        let db = test_db();
        let err = ensure_subscription_active(&db, Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::SubscriptionExpired { .. }));

        set_active_until(&db, Utc::now() + Duration::days(30)).unwrap();
        ensure_subscription_active(&db, Utc::now()).unwrap();
    }

    #[test]
    fn renewal_link_targets_admin_number() {
        let profile = Profile {
            laundry_name: "Laundry Berkah".into(),
            address: String::new(),
            phone: String::new(),
            active_until: Utc::now(),
        };
        let link = renewal_link(&profile);
        assert!(link.starts_with("https://wa.me/62895324443540?text="));
        assert!(link.contains("Laundry%20Berkah"));
        assert!(!link.contains(' '));
    }

    #[test]
    fn template_defaults_are_seeded_and_editable() {
        let db = test_db();
        let template = get_template(&db).unwrap();
        assert!(template.header.contains("Terima kasih"));

        update_template(
            &db,
            &MessageTemplate {
                header: "Halo!".into(),
                footer: "Sampai jumpa.".into(),
            },
        )
        .unwrap();
        assert_eq!(get_template(&db).unwrap().footer, "Sampai jumpa.");
    }
}
