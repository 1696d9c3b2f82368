// Contact list with search and selection

use log::debug;

use crate::models::Contact;

#[derive(Debug, Clone, Default)]
pub struct ContactList {
    contacts: Vec<Contact>,
    selected: Option<String>,
}

impl ContactList {
    pub fn new(contacts: Vec<Contact>) -> Self {
        ContactList {
            contacts,
            selected: None,
        }
    }

    pub fn all(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn get(&self, contact_id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == contact_id)
    }

    /// Contacts whose name contains `query` (case-insensitive) or whose phone number
    /// contains it verbatim. An empty query matches everyone.
    pub fn search(&self, query: &str) -> Vec<&Contact> {
        let needle = query.to_lowercase();
        self.contacts
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle) || c.phone.contains(query))
            .collect()
    }

    /// Mark a contact as the open chat. Opening a chat clears its unread badge.
    pub fn select(&mut self, contact_id: &str) -> Option<&Contact> {
        let contact = self.contacts.iter_mut().find(|c| c.id == contact_id)?;
        contact.unread_count = 0;
        self.selected = Some(contact_id.to_string());
        debug!("Selected contact {}", contact_id);
        self.get(contact_id)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Contact> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// Update the preview line shown under the contact's name
    pub fn set_last_message(&mut self, contact_id: &str, text: &str, time: &str) {
        if let Some(contact) = self.contacts.iter_mut().find(|c| c.id == contact_id) {
            contact.last_message = Some(text.to_string());
            contact.last_message_time = Some(time.to_string());
        }
    }
}
