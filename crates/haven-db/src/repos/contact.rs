//! Trusted contact repository.
//!
//! Contacts are scoped by owner. Sessions copy the recipients they need at
//! creation, so removing a contact never changes a running session.

use haven_core::entities::{Recipient, TrustedContact, normalize_phone};
use haven_core::errors::CoreError;
use haven_core::ids::PREFIX_CONTACT;

use crate::error::DatabaseError;
use crate::helpers::{is_unique_violation, parse_datetime};
use crate::service::HavenService;

const CONTACT_COLUMNS: &str = "id, owner_id, name, phone_number, created_at";

impl HavenService {
    /// Add a trusted contact for `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` (wrapped) for a blank name, a phone
    /// number without digits, or a number the owner already has.
    pub async fn add_contact(
        &self,
        owner_id: &str,
        name: &str,
        phone_number: &str,
    ) -> Result<TrustedContact, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("contact name must not be empty".into()).into());
        }
        let phone_number = normalize_phone(phone_number);
        if !phone_number.chars().any(|c| c.is_ascii_digit()) {
            return Err(CoreError::Validation("contact phone number must contain digits".into()).into());
        }

        let contact = TrustedContact {
            id: self.db().generate_id(PREFIX_CONTACT).await?,
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            phone_number,
            created_at: self.now(),
        };

        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT INTO contacts (id, owner_id, name, phone_number, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    contact.id.as_str(),
                    contact.owner_id.as_str(),
                    contact.name.as_str(),
                    contact.phone_number.as_str(),
                    contact.created_at.to_rfc3339()
                ],
            )
            .await;
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(CoreError::Validation(format!(
                    "{} is already one of your trusted contacts",
                    contact.phone_number
                ))
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(contact = %contact.id, owner = owner_id, "trusted contact added");
        Ok(contact)
    }

    /// All contacts of `owner_id`, in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_contacts(&self, owner_id: &str) -> Result<Vec<TrustedContact>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {CONTACT_COLUMNS} FROM contacts WHERE owner_id = ?1
                     ORDER BY created_at ASC, rowid ASC"
                ),
                [owner_id],
            )
            .await?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next().await? {
            contacts.push(row_to_contact(&row)?);
        }
        Ok(contacts)
    }

    /// Remove one of `owner_id`'s contacts.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` (wrapped) if the owner has no such contact.
    pub async fn remove_contact(&self, owner_id: &str, contact_id: &str) -> Result<(), DatabaseError> {
        let removed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM contacts WHERE id = ?1 AND owner_id = ?2",
                [contact_id, owner_id],
            )
            .await?;
        if removed == 0 {
            return Err(DatabaseError::not_found("contact", contact_id));
        }
        Ok(())
    }

    /// Resolve the recipients for a new session.
    ///
    /// An empty `contact_ids` selects every contact of the owner, in the
    /// order they were added. Otherwise the requested order is kept.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` (wrapped) for an id the owner does not
    /// have. An owner without contacts yields an empty list; session creation
    /// rejects that.
    pub async fn resolve_recipients(
        &self,
        owner_id: &str,
        contact_ids: &[String],
    ) -> Result<Vec<Recipient>, DatabaseError> {
        let contacts = self.list_contacts(owner_id).await?;
        if contact_ids.is_empty() {
            return Ok(contacts.iter().map(TrustedContact::to_recipient).collect());
        }

        let mut recipients = Vec::with_capacity(contact_ids.len());
        for id in contact_ids {
            let contact = contacts
                .iter()
                .find(|c| &c.id == id)
                .ok_or_else(|| DatabaseError::not_found("contact", id))?;
            if !recipients.iter().any(|r: &Recipient| r.id == contact.id) {
                recipients.push(contact.to_recipient());
            }
        }
        Ok(recipients)
    }
}

fn row_to_contact(row: &libsql::Row) -> Result<TrustedContact, DatabaseError> {
    Ok(TrustedContact {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        phone_number: row.get(3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::test_support::test_service;

    #[tokio::test]
    async fn add_and_list_in_insertion_order() {
        let (svc, _clock) = test_service().await;
        let sam = svc.add_contact("alex", "Sam", "+1 (555) 010-0001").await.unwrap();
        let kim = svc.add_contact("alex", "Kim", "555 0002").await.unwrap();
        svc.add_contact("someone-else", "Lee", "5550003").await.unwrap();

        assert_eq!(sam.phone_number, "+15550100001");
        let listed = svc.list_contacts("alex").await.unwrap();
        assert_eq!(listed, vec![sam, kim]);
    }

    #[tokio::test]
    async fn duplicate_phone_for_same_owner_is_rejected() {
        let (svc, _clock) = test_service().await;
        svc.add_contact("alex", "Sam", "555-0001").await.unwrap();
        let err = svc.add_contact("alex", "Samuel", "5550001").await.unwrap_err();
        assert!(err.is_validation(), "{err}");

        // Another owner may use the same number.
        svc.add_contact("kim", "Sam", "5550001").await.unwrap();
    }

    #[tokio::test]
    async fn blank_name_and_digitless_phone_are_rejected() {
        let (svc, _clock) = test_service().await;
        assert!(svc.add_contact("alex", "  ", "5550001").await.unwrap_err().is_validation());
        assert!(svc.add_contact("alex", "Sam", "call me").await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn remove_only_own_contacts() {
        let (svc, _clock) = test_service().await;
        let sam = svc.add_contact("alex", "Sam", "5550001").await.unwrap();

        assert!(svc.remove_contact("kim", &sam.id).await.unwrap_err().is_not_found());
        svc.remove_contact("alex", &sam.id).await.unwrap();
        assert!(svc.list_contacts("alex").await.unwrap().is_empty());
        assert!(svc.remove_contact("alex", &sam.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn resolve_recipients_defaults_to_everyone() {
        let (svc, _clock) = test_service().await;
        let sam = svc.add_contact("alex", "Sam", "5550001").await.unwrap();
        let kim = svc.add_contact("alex", "Kim", "5550002").await.unwrap();

        let all = svc.resolve_recipients("alex", &[]).await.unwrap();
        assert_eq!(all, vec![sam.to_recipient(), kim.to_recipient()]);

        let picked = svc
            .resolve_recipients("alex", &[kim.id.clone(), kim.id.clone()])
            .await
            .unwrap();
        assert_eq!(picked, vec![kim.to_recipient()]);

        let err = svc
            .resolve_recipients("alex", &["cnt-missing".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn owner_without_contacts_resolves_to_nobody() {
        let (svc, _clock) = test_service().await;
        assert!(svc.resolve_recipients("alex", &[]).await.unwrap().is_empty());
    }
}
