// Contact roster: the seeded contact set and its groups
//
// Readers everywhere treat contacts as read-only. Status and lastSeen are
// written only through `presence::PresenceEngine`.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{Contact, ContactGroup, ContactStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    contacts: Vec<Contact>,
    groups: Vec<ContactGroup>,
}

impl Roster {
    pub fn new(contacts: Vec<Contact>, groups: Vec<ContactGroup>) -> Self {
        Roster { contacts, groups }
    }

    /// The fixed roster every fresh session starts from.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Roster::new(seed_contacts(now), seed_groups())
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
        self.groups.clear();
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn groups(&self) -> &[ContactGroup] {
        &self.groups
    }

    pub fn get(&self, contact_id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == contact_id)
    }

    pub fn group(&self, group_id: &str) -> Option<&ContactGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub(crate) fn get_mut(&mut self, contact_id: &str) -> Option<&mut Contact> {
        self.contacts.iter_mut().find(|c| c.id == contact_id)
    }

    /// Number of contacts shown as connected (online, away or busy).
    pub fn online_count(&self) -> usize {
        self.contacts.iter().filter(|c| c.status.is_available()).count()
    }

    /// All contacts in display order.
    pub fn sorted_contacts(&self) -> Vec<&Contact> {
        let mut sorted: Vec<&Contact> = self.contacts.iter().collect();
        sorted.sort_by(|a, b| display_order(a, b));
        sorted
    }

    /// Members of a group in display order. Unknown ids resolve to nothing.
    pub fn contacts_in_group(&self, group_id: &str) -> Vec<&Contact> {
        let Some(group) = self.group(group_id) else {
            return Vec::new();
        };
        let mut members: Vec<&Contact> = group
            .contact_ids
            .iter()
            .filter_map(|id| self.get(id))
            .collect();
        members.sort_by(|a, b| display_order(a, b));
        members
    }

    /// Flips a group's expanded flag. Returns the new state.
    pub fn toggle_group(&mut self, group_id: &str) -> Option<bool> {
        let group = self.groups.iter_mut().find(|g| g.id == group_id)?;
        group.is_expanded = !group.is_expanded;
        debug!("Group {} expanded: {}", group_id, group.is_expanded);
        Some(group.is_expanded)
    }

    /// Adds a contact and registers it in each of its groups. A contact id
    /// that already exists is ignored.
    pub fn add_contact(&mut self, contact: Contact) -> bool {
        if self.get(&contact.id).is_some() {
            debug!("Ignoring duplicate contact {}", contact.id);
            return false;
        }
        for group in self.groups.iter_mut() {
            if contact.groups.contains(&group.id) && !group.contact_ids.contains(&contact.id) {
                group.contact_ids.push(contact.id.clone());
            }
        }
        info!("Added contact {} ({})", contact.id, contact.display_name);
        self.contacts.push(contact);
        true
    }

    pub fn remove_contact(&mut self, contact_id: &str) -> Option<Contact> {
        let idx = self.contacts.iter().position(|c| c.id == contact_id)?;
        for group in self.groups.iter_mut() {
            group.contact_ids.retain(|id| id != contact_id);
        }
        info!("Removed contact {}", contact_id);
        Some(self.contacts.remove(idx))
    }
}

/// Display order: presence rank, then case-insensitive name.
pub fn display_order(a: &Contact, b: &Contact) -> Ordering {
    a.status
        .display_rank()
        .cmp(&b.status.display_rank())
        .then_with(|| compare_names(&a.display_name, &b.display_name))
}

/// Case- and accent-insensitive name comparison, falling back to the raw
/// strings so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

struct Seed {
    id: &'static str,
    email: &'static str,
    display_name: &'static str,
    nickname: Option<&'static str>,
    personal_message: &'static str,
    status: ContactStatus,
    groups: &'static [&'static str],
    last_seen_minutes_ago: i64,
}

const SEED_CONTACTS: [Seed; 8] = [
    Seed {
        id: "contact-1",
        email: "maria.gonzalez@hotmail.com",
        display_name: "María González",
        nickname: Some("Mary"),
        personal_message: "Estudiando para los exámenes 📚",
        status: ContactStatus::Online,
        groups: &["friends", "university"],
        last_seen_minutes_ago: 0,
    },
    Seed {
        id: "contact-2",
        email: "carlos.rodriguez@hotmail.com",
        display_name: "Carlos Rodríguez",
        nickname: Some("Charlie"),
        personal_message: "Jugando FIFA 2005 ⚽",
        status: ContactStatus::Away,
        groups: &["friends", "gaming"],
        last_seen_minutes_ago: 5,
    },
    Seed {
        id: "contact-3",
        email: "ana.martinez@msn.com",
        display_name: "Ana Martínez",
        nickname: Some("Anita"),
        personal_message: "Escuchando Shakira 🎵",
        status: ContactStatus::Busy,
        groups: &["family", "music"],
        last_seen_minutes_ago: 2,
    },
    Seed {
        id: "contact-4",
        email: "luis.fernandez@hotmail.es",
        display_name: "Luis Fernández",
        nickname: None,
        personal_message: "",
        status: ContactStatus::Offline,
        groups: &["work"],
        last_seen_minutes_ago: 120,
    },
    Seed {
        id: "contact-5",
        email: "sofia.lopez@hotmail.com",
        display_name: "Sofía López",
        nickname: Some("Sofi"),
        personal_message: "Viendo Friends por 100ª vez 📺",
        status: ContactStatus::Online,
        groups: &["friends", "tv-shows"],
        last_seen_minutes_ago: 0,
    },
    Seed {
        id: "contact-6",
        email: "diego.morales@msn.com",
        display_name: "Diego Morales",
        nickname: Some("Dieg"),
        personal_message: "Programando en Visual Basic 💻",
        status: ContactStatus::AppearOffline,
        groups: &["university", "programming"],
        last_seen_minutes_ago: 30,
    },
    Seed {
        id: "contact-7",
        email: "valentina.torres@hotmail.com",
        display_name: "Valentina Torres",
        nickname: Some("Vale"),
        personal_message: "Chateando desde el ciber ☕",
        status: ContactStatus::Online,
        groups: &["friends"],
        last_seen_minutes_ago: 0,
    },
    Seed {
        id: "contact-8",
        email: "miguel.santos@hotmail.com",
        display_name: "Miguel Santos",
        nickname: Some("Migue"),
        personal_message: "Descargando música en Ares 🎶",
        status: ContactStatus::Away,
        groups: &["friends", "music"],
        last_seen_minutes_ago: 10,
    },
];

const SEED_GROUPS: [(&str, &str, bool, &[&str]); 8] = [
    ("friends", "Amigos", true, &["contact-1", "contact-2", "contact-5", "contact-7", "contact-8"]),
    ("family", "Familia", true, &["contact-3"]),
    ("university", "Universidad", false, &["contact-1", "contact-6"]),
    ("work", "Trabajo", false, &["contact-4"]),
    ("gaming", "Gaming", false, &["contact-2"]),
    ("music", "Música", false, &["contact-3", "contact-8"]),
    ("tv-shows", "Series TV", false, &["contact-5"]),
    ("programming", "Programación", false, &["contact-6"]),
];

fn seed_contacts(now: DateTime<Utc>) -> Vec<Contact> {
    SEED_CONTACTS
        .iter()
        .map(|seed| Contact {
            id: seed.id.to_string(),
            email: seed.email.to_string(),
            display_name: seed.display_name.to_string(),
            nickname: seed.nickname.map(str::to_string),
            status: seed.status,
            personal_message: seed.personal_message.to_string(),
            avatar: None,
            last_seen: Some(now - ChronoDuration::minutes(seed.last_seen_minutes_ago)),
            groups: seed.groups.iter().map(|g| g.to_string()).collect::<BTreeSet<_>>(),
            is_blocked: false,
        })
        .collect()
}

fn seed_groups() -> Vec<ContactGroup> {
    SEED_GROUPS
        .iter()
        .map(|(id, name, expanded, members)| ContactGroup {
            id: id.to_string(),
            name: name.to_string(),
            is_expanded: *expanded,
            contact_ids: members.iter().map(|m| m.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::seeded(Utc::now())
    }

    #[test]
    fn test_seeded_roster_shape() {
        let roster = roster();
        assert_eq!(roster.len(), 8);
        assert_eq!(roster.groups().len(), 8);
        // online, away or busy: contacts 1, 2, 3, 5, 7, 8
        assert_eq!(roster.online_count(), 6);
        assert_eq!(roster.get("contact-4").map(|c| c.status), Some(ContactStatus::Offline));
    }

    #[test]
    fn test_sorted_by_presence_then_name() {
        let roster = roster();
        let names: Vec<&str> = roster.sorted_contacts().iter().map(|c| c.display_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "María González",
                "Sofía López",
                "Valentina Torres",
                "Carlos Rodríguez",
                "Miguel Santos",
                "Ana Martínez",
                "Diego Morales",
                "Luis Fernández",
            ]
        );
    }

    #[test]
    fn test_name_compare_ignores_case_and_accents() {
        assert_eq!(compare_names("álvaro", "Beto"), Ordering::Less);
        assert_eq!(compare_names("zoe", "Ángel"), Ordering::Greater);
        assert_ne!(compare_names("Ana", "ana"), Ordering::Equal);
    }

    #[test]
    fn test_group_members_and_toggle() {
        let mut roster = roster();
        let music: Vec<&str> = roster.contacts_in_group("music").iter().map(|c| c.id.as_str()).collect();
        // Miguel (away) sorts before Ana (busy)
        assert_eq!(music, vec!["contact-8", "contact-3"]);
        assert!(roster.contacts_in_group("nope").is_empty());

        assert_eq!(roster.toggle_group("work"), Some(true));
        assert_eq!(roster.toggle_group("work"), Some(false));
        assert_eq!(roster.toggle_group("nope"), None);
    }

    #[test]
    fn test_add_and_remove_contact() {
        let mut roster = roster();
        let mut newcomer = roster.get("contact-7").cloned().unwrap();
        newcomer.id = "contact-9".to_string();
        newcomer.display_name = "Pablo Ruiz".to_string();

        assert!(roster.add_contact(newcomer.clone()));
        assert!(!roster.add_contact(newcomer));
        assert!(roster.group("friends").unwrap().contact_ids.contains(&"contact-9".to_string()));

        let removed = roster.remove_contact("contact-9").unwrap();
        assert_eq!(removed.display_name, "Pablo Ruiz");
        assert!(!roster.group("friends").unwrap().contact_ids.contains(&"contact-9".to_string()));
        assert!(roster.remove_contact("contact-9").is_none());
    }
}
