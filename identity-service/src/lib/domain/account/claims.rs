use auth::Claims;
use chrono::DateTime;
use chrono::Utc;

use crate::account::models::Account;

/// Snapshot the identity facts of `account` into a claim set issued at `now`.
///
/// Total over any well-formed account; the token expires 24 hours after `now`.
pub fn build(account: &Account, now: DateTime<Utc>) -> Claims {
    Claims::new(
        account.id,
        account.handle.as_str(),
        account.display_name.as_str(),
        account.email.as_str(),
        now,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::TimeZone;

    use super::*;
    use crate::account::models::AccountId;
    use crate::account::models::DisplayName;
    use crate::account::models::EmailAddress;

    #[test]
    fn test_build_copies_account_fields() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let account = Account {
            id: AccountId::new(),
            handle: EmailAddress::new("a@x.com".to_string()).unwrap(),
            display_name: DisplayName::new("Alice".to_string()).unwrap(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            credential_hash: "$argon2id$hash".to_string(),
            created_at,
            updated_at: created_at,
        };

        let claims = build(&account, now);

        assert_eq!(claims.subject_id, account.id.to_string());
        assert_eq!(claims.handle, "a@x.com");
        assert_eq!(claims.display_name, "Alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.issued_at, now.timestamp());
        assert_eq!(claims.expires_at, (now + Duration::hours(24)).timestamp());
    }
}
