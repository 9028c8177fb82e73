// Localized kiosk prompts

use crate::language::Language;

/// Shown on session start and after every reset
pub fn greeting(language: Language) -> &'static str {
    match language {
        Language::Pt => "Aperta o botão vermelho e solta",
        Language::En => "Press the red button and release",
        Language::Es => "Presiona el botón rojo y suelta",
        Language::Fr => "Appuyez sur le bouton rouge et relâchez",
        Language::It => "Premi il pulsante rosso e rilascia",
    }
}

/// Placeholder shown while the reply is being prepared
pub fn processing(language: Language) -> &'static str {
    match language {
        Language::Pt => "Processando...",
        Language::En => "Processing...",
        Language::Es => "Procesando...",
        Language::Fr => "Traitement...",
        Language::It => "Elaborazione...",
    }
}

/// Shown when a reply cannot be played before the first interaction
pub fn playback_blocked(language: Language) -> &'static str {
    match language {
        Language::Pt => "Toque na tela para ouvir a resposta",
        Language::En => "Tap the screen to hear the reply",
        Language::Es => "Toca la pantalla para escuchar la respuesta",
        Language::Fr => "Touchez l'écran pour entendre la réponse",
        Language::It => "Tocca lo schermo per ascoltare la risposta",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_distinct_prompts() {
        for language in Language::ALL {
            assert!(!greeting(language).is_empty());
            assert_ne!(greeting(language), processing(language));
            assert_ne!(processing(language), playback_blocked(language));
        }
        assert_eq!(processing(Language::En), "Processing...");
    }
}
