use whatlang::{Lang, detect};

const MIN_CONFIDENCE: f64 = 0.25;
const MIN_TEXT_LENGTH: usize = 50;

/// Best-effort ISO 639-1 code for `text`, `None` for short or ambiguous input.
pub fn detect_language(text: &str) -> Option<String> {
    if text.trim().chars().count() < MIN_TEXT_LENGTH {
        return None;
    }

    let info = detect(text)?;
    if info.confidence() < MIN_CONFIDENCE {
        return None;
    }

    Some(iso_639_1(info.lang()))
}

fn iso_639_1(lang: Lang) -> String {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Pol => "pl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Tur => "tr",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Fin => "fi",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Ara => "ar",
        Lang::Heb => "he",
        Lang::Hin => "hi",
        // No two-letter mapping kept for the long tail; fall back to ISO 639-3.
        other => return other.code().to_string(),
    };
    code.to_string()
}
