// Auto-response phrase pools
//
// The pool for a contact is the generic greetings, plus the phrases of every
// interest its personal message mentions, plus phrases for its status.
// Every matching category is pooled before the uniform pick.

use crate::models::{Contact, ContactStatus};
use crate::random::RandomSource;

const GREETINGS: [&str; 6] = [
    "¡Hola! ¿Cómo estás? :)",
    "¿Qué tal todo?",
    "¡Hey! ¿Cómo has estado?",
    "¡Hola! :D",
    "¿Todo bien?",
    "¡Buenas! ¿Qué haces?",
];

/// Topics a personal message can reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Studying,
    Gaming,
    Music,
    Television,
    Programming,
}

impl Interest {
    pub const ALL: [Interest; 5] = [
        Interest::Studying,
        Interest::Gaming,
        Interest::Music,
        Interest::Television,
        Interest::Programming,
    ];

    /// Lowercase substrings that reveal this interest.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Interest::Studying => &["estudian"],
            Interest::Gaming => &["fifa", "jugan"],
            Interest::Music => &["música", "shakira"],
            Interest::Television => &["friends", "viendo"],
            Interest::Programming => &["programan", "visual basic"],
        }
    }

    pub fn phrases(self) -> &'static [&'static str] {
        match self {
            Interest::Studying => &[
                "Estoy estudiando también :S",
                "¡Los exámenes son terribles! :(",
                "¿Ya terminaste de estudiar?",
                "Necesito un descanso de tanto estudio :P",
            ],
            Interest::Gaming => &[
                "¡Vamos a jugar FIFA! :D",
                "¿Una partidita?",
                "Estoy mejorando mi técnica ;)",
                "¡Mi equipo favorito va ganando! (y)",
            ],
            Interest::Music => &[
                "¡Amo esa canción! (h)",
                "¿Has escuchado el nuevo álbum?",
                "La música de hoy está genial :D",
                "Compárteme esa canción :P",
            ],
            Interest::Television => &[
                "¡Friends es lo máximo! :D",
                "¿Cuál es tu episodio favorito?",
                "Ross y Rachel forever (h)",
                "Joey es el mejor :P",
            ],
            Interest::Programming => &[
                "¿En qué estás programando?",
                "Visual Basic es genial para empezar",
                "Estoy aprendiendo C++ :S",
                "¿Me ayudas con mi código? :P",
            ],
        }
    }

    /// Interests mentioned in `personal_message`, matched case-insensitively.
    pub fn detect(personal_message: &str) -> Vec<Interest> {
        let lowered = personal_message.to_lowercase();
        Interest::ALL
            .into_iter()
            .filter(|i| i.keywords().iter().any(|k| lowered.contains(k)))
            .collect()
    }
}

fn status_phrases(status: ContactStatus) -> &'static [&'static str] {
    match status {
        ContactStatus::Busy => &[
            "Estoy ocupado pero puedo chatear un rato",
            "Solo un ratito, tengo cosas que hacer :S",
            "Rápido, que ando apurado :P",
        ],
        ContactStatus::Away => &[
            "Acabo de regresar",
            "Estaba haciendo otras cosas",
            "¿Me escribiste hace rato?",
        ],
        ContactStatus::Online | ContactStatus::AppearOffline | ContactStatus::Offline => &[],
    }
}

/// Every phrase the contact might answer with right now.
pub fn response_pool(contact: &Contact) -> Vec<&'static str> {
    let mut pool: Vec<&'static str> = GREETINGS.to_vec();
    for interest in Interest::detect(&contact.personal_message) {
        pool.extend_from_slice(interest.phrases());
    }
    pool.extend_from_slice(status_phrases(contact.status));
    pool
}

/// Picks one phrase uniformly from the contact's pool.
pub fn pick_response(contact: &Contact, rng: &mut dyn RandomSource) -> &'static str {
    let pool = response_pool(contact);
    pool[rng.pick_index(pool.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use crate::roster::Roster;

    fn contact(id: &str) -> Contact {
        Roster::seeded(chrono::Utc::now()).get(id).cloned().unwrap()
    }

    #[test]
    fn test_detects_interests_regardless_of_case() {
        assert_eq!(Interest::detect("Estudiando para los exámenes 📚"), vec![Interest::Studying]);
        assert_eq!(Interest::detect("Jugando FIFA 2005 ⚽"), vec![Interest::Gaming]);
        assert_eq!(Interest::detect("Programando en Visual Basic 💻"), vec![Interest::Programming]);
        assert_eq!(
            Interest::detect("Viendo Friends mientras escucho música"),
            vec![Interest::Music, Interest::Television]
        );
        assert!(Interest::detect("").is_empty());
    }

    #[test]
    fn test_pool_is_cumulative() {
        // Ana: Shakira fan, busy
        let ana = contact("contact-3");
        let pool = response_pool(&ana);
        assert_eq!(pool.len(), GREETINGS.len() + 4 + 3);
        assert!(pool.contains(&"¡Amo esa canción! (h)"));
        assert!(pool.contains(&"Rápido, que ando apurado :P"));
    }

    #[test]
    fn test_plain_online_contact_gets_greetings_only() {
        // Luis has no personal message
        let mut luis = contact("contact-4");
        luis.status = ContactStatus::Online;
        assert_eq!(response_pool(&luis), GREETINGS.to_vec());
    }

    #[test]
    fn test_pick_is_uniform_over_pool() {
        let carlos = contact("contact-2");
        let pool = response_pool(&carlos);
        let mut rng = ScriptedRandom::new([0.0, 0.999]);
        assert_eq!(pick_response(&carlos, &mut rng), pool[0]);
        assert_eq!(pick_response(&carlos, &mut rng), *pool.last().unwrap());
    }
}
