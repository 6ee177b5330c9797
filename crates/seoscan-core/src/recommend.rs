//! Score vector → HTML recommendation report.
//!
//! Pure: the same scores, keyword and locale always render byte-identical
//! output. The average picks at most one conditional section; the six
//! general sections are always present.

use crate::{AnalysisResult, Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Averages below this get the "very low keyword density" section.
pub const VERY_LOW_THRESHOLD: f64 = 0.3;
/// Averages at or above this count as optimized.
pub const OPTIMIZED_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLocale {
    #[default]
    English,
    Polish,
}

impl FromStr for ReportLocale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "pl" | "polish" => Ok(Self::Polish),
            other => Err(Error::Configuration(format!(
                "unknown report locale {other:?} (allowed: en, pl)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    VeryLow,
    UnderEmphasized,
    Optimized,
}

impl ScoreBand {
    pub fn classify(average: f64) -> Self {
        if average < VERY_LOW_THRESHOLD {
            Self::VeryLow
        } else if average < OPTIMIZED_THRESHOLD {
            Self::UnderEmphasized
        } else {
            Self::Optimized
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    VeryLowDensity,
    UnderEmphasized,
    Headings,
    MetaTags,
    ContentStructure,
    Multimedia,
    Linking,
    Technical,
}

impl Section {
    /// Sections rendered for every report, in order.
    pub const ALWAYS: [Section; 6] = [
        Section::Headings,
        Section::MetaTags,
        Section::ContentStructure,
        Section::Multimedia,
        Section::Linking,
        Section::Technical,
    ];

    fn lines(self, kw: &str, locale: ReportLocale) -> Vec<String> {
        match locale {
            ReportLocale::English => english_lines(self, kw),
            ReportLocale::Polish => polish_lines(self, kw),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub keyword: String,
    pub average_score: f64,
    pub band: ScoreBand,
    pub is_optimized: bool,
    pub sections: Vec<Section>,
    pub html: String,
}

impl From<Report> for AnalysisResult {
    fn from(r: Report) -> Self {
        AnalysisResult {
            keyword: r.keyword,
            recommendations: r.html,
            is_optimized: r.is_optimized,
        }
    }
}

/// Mean of the scores, accumulated in f64 and rounded to f32 precision.
///
/// Thresholds are applied to the rounded value, so a mean within one f32 ULP
/// of a threshold lands on the same side the model's own precision puts it.
pub fn average(scores: &[f32]) -> Result<f64> {
    if scores.is_empty() {
        return Err(Error::Data("score vector is empty".to_string()));
    }
    let sum: f64 = scores.iter().map(|&s| f64::from(s)).sum();
    let mean = (sum / scores.len() as f64) as f32;
    Ok(f64::from(mean))
}

pub fn report(scores: &[f32], keyword: &str, locale: ReportLocale) -> Result<Report> {
    let average_score = average(scores)?;
    if !average_score.is_finite() {
        return Err(Error::Data(format!(
            "average score is not finite: {average_score}"
        )));
    }
    let band = ScoreBand::classify(average_score);
    let is_optimized = average_score >= OPTIMIZED_THRESHOLD;

    let mut sections = Vec::with_capacity(7);
    match band {
        ScoreBand::VeryLow => sections.push(Section::VeryLowDensity),
        ScoreBand::UnderEmphasized => sections.push(Section::UnderEmphasized),
        ScoreBand::Optimized => {}
    }
    sections.extend(Section::ALWAYS);

    let kw = html_escape::encode_safe(keyword);
    let body = sections
        .iter()
        .flat_map(|s| s.lines(&kw, locale))
        .collect::<Vec<_>>()
        .join("\n");
    let html = render_document(&kw, average_score, is_optimized, &body, locale);

    Ok(Report {
        keyword: keyword.to_string(),
        average_score,
        band,
        is_optimized,
        sections,
        html,
    })
}

pub fn recommend(scores: &[f32], keyword: &str, locale: ReportLocale) -> Result<AnalysisResult> {
    report(scores, keyword, locale).map(AnalysisResult::from)
}

fn render_document(
    kw: &str,
    average: f64,
    is_optimized: bool,
    recommendations: &str,
    locale: ReportLocale,
) -> String {
    let (title, heading, avg_label, status_label, recs_heading, status) = match locale {
        ReportLocale::English => (
            format!("SEO analysis for '{kw}'"),
            "SEO analysis results",
            "Average score",
            "Optimization status",
            "Recommendations",
            if is_optimized {
                "Optimization successful"
            } else {
                "Needs improvement"
            },
        ),
        ReportLocale::Polish => (
            format!("Analiza SEO dla '{kw}'"),
            "Wyniki analizy SEO",
            "Średni wynik",
            "Status optymalizacji",
            "Rekomendacje",
            if is_optimized {
                "Optymalizacja zakończona sukcesem"
            } else {
                "Wymaga poprawy"
            },
        ),
    };
    format!(
        "<html>\n<head>\n    <title>{title}</title>\n</head>\n<body>\n    <h1>{heading}</h1>\n    <p>{avg_label}: {average:.2}</p>\n    <p>{status_label}: {status}</p>\n    <h2>{recs_heading}</h2>\n    <ul>\n{recommendations}\n    </ul>\n</body>\n</html>\n"
    )
}

fn english_lines(section: Section, kw: &str) -> Vec<String> {
    match section {
        Section::VeryLowDensity => vec![
            "<li>Keyword density is very low. The keyword currently appears too rarely. Make sure it appears naturally at least 2-3 times per 500 words.</li>".to_string(),
        ],
        Section::UnderEmphasized => vec![
            "<li>The keyword is present but not emphasized enough. Consider:".to_string(),
            "<ul>".to_string(),
            "<li>Adding the keyword to the opening paragraph.</li>".to_string(),
            "<li>Placing the keyword in subheadings (H2, H3).</li>".to_string(),
            "<li>Including the phrase in the closing paragraph.</li>".to_string(),
            "</ul></li>".to_string(),
        ],
        Section::Headings => vec![
            "<li>The keyword is not used enough in headings. Make sure it appears in:".to_string(),
            "<ul>".to_string(),
            format!("<li>H1: '{kw} - The complete guide'</li>"),
            format!("<li>H2: 'Benefits of {kw}'</li>"),
            format!("<li>H3: 'How to choose the best {kw}'</li>"),
            "</ul></li>".to_string(),
        ],
        Section::MetaTags => vec![
            format!("<li>Check the meta title and meta description. They are not optimized for '{kw}' yet. Add elements such as:"),
            "<ul>".to_string(),
            format!("<li>Meta Title: '{kw} | The best solutions near you'</li>"),
            format!("<li>Meta Description: 'Discover the best {kw} solutions. Sales, service and support tailored to your needs.'</li>"),
            "</ul></li>".to_string(),
        ],
        Section::ContentStructure => vec![
            "<li>The content structure needs work. There are no sections with clear headings. Action items:".to_string(),
            "<ul>".to_string(),
            "<li>Split the content into sections with headings.</li>".to_string(),
            "<li>Use bullet points, numbered lists and short paragraphs.</li>".to_string(),
            "</ul></li>".to_string(),
        ],
        Section::Multimedia => vec![
            format!("<li>The page has no multimedia. Add images and videos and include '{kw}' in their alt attributes. Example:"),
            "<ul>".to_string(),
            format!("<li><img src='example.jpg' alt='{kw} in practice'></li>"),
            "</ul></li>".to_string(),
        ],
        Section::Linking => vec![
            "<li>Linking is insufficient. Changes to make:".to_string(),
            "<ul>".to_string(),
            "<li>Add internal links to related pages.</li>".to_string(),
            format!("<li>Example link: <a href='/related-page'>Learn more about {kw}</a></li>"),
            "</ul></li>".to_string(),
        ],
        Section::Technical => vec![
            "<li>Technical optimization is lacking. To do:".to_string(),
            "<ul>".to_string(),
            "<li>Improve page load speed.</li>".to_string(),
            "<li>Make sure the page is mobile friendly.</li>".to_string(),
            "<li>Verify that the page is correctly indexed by search engines.</li>".to_string(),
            "</ul></li>".to_string(),
        ],
    }
}

fn polish_lines(section: Section, kw: &str) -> Vec<String> {
    match section {
        Section::VeryLowDensity => vec![
            "<li>Gęstość słów kluczowych jest bardzo niska. Obecnie słowo kluczowe występuje zbyt rzadko. Upewnij się, że pojawia się co najmniej 2-3 razy na każde 500 słów w sposób naturalny.</li>".to_string(),
        ],
        Section::UnderEmphasized => vec![
            "<li>Słowo kluczowe jest obecne, ale niewystarczająco podkreślone. Rozważ:".to_string(),
            "<ul>".to_string(),
            "<li>Dodanie słowa kluczowego w początkowym akapicie.</li>".to_string(),
            "<li>Umieszczenie słowa w nagłówkach (H2, H3).</li>".to_string(),
            "<li>Zawieranie frazy w akapicie końcowym.</li>".to_string(),
            "</ul></li>".to_string(),
        ],
        Section::Headings => vec![
            "<li>Obecnie brak wystarczającego użycia słowa kluczowego w nagłówkach. Upewnij się, że pojawia się w:".to_string(),
            "<ul>".to_string(),
            format!("<li>H1: '{kw} - Kompletny przewodnik'</li>"),
            format!("<li>H2: 'Korzyści z {kw}'</li>"),
            format!("<li>H3: 'Jak wybrać najlepsze {kw}'</li>"),
            "</ul></li>".to_string(),
        ],
        Section::MetaTags => vec![
            format!("<li>Sprawdź tytuł meta i opis meta. Aktualnie brak optymalizacji dla frazy '{kw}'. Dodaj takie elementy:"),
            "<ul>".to_string(),
            format!("<li>Meta Title: '{kw} | Najlepsze rozwiązania w Twojej okolicy'</li>"),
            format!("<li>Meta Description: 'Odkryj najlepsze rozwiązania {kw}. Sprzedaż, serwis i wsparcie dostosowane do Twoich potrzeb.'</li>"),
            "</ul></li>".to_string(),
        ],
        Section::ContentStructure => vec![
            "<li>Struktura treści wymaga poprawy. Obecnie brak sekcji z wyraźnymi nagłówkami. Działania do wykonania:".to_string(),
            "<ul>".to_string(),
            "<li>Podziel treść na sekcje z nagłówkami.</li>".to_string(),
            "<li>Użyj punktów, numerowanych list i krótkich akapitów.</li>".to_string(),
            "</ul></li>".to_string(),
        ],
        Section::Multimedia => vec![
            format!("<li>Obecnie brak multimediów na stronie. Dodaj obrazy i filmy, a w ich atrybutach alt zawrzyj frazę '{kw}'. Przykład:"),
            "<ul>".to_string(),
            format!("<li><img src='example.jpg' alt='{kw} w praktyce'></li>"),
            "</ul></li>".to_string(),
        ],
        Section::Linking => vec![
            "<li>Aktualnie brak odpowiedniego linkowania. Wprowadź zmiany:".to_string(),
            "<ul>".to_string(),
            "<li>Dodaj linki wewnętrzne do powiązanych stron.</li>".to_string(),
            format!("<li>Przykład linku: <a href='/related-page'>Dowiedz się więcej o {kw}</a></li>"),
            "</ul></li>".to_string(),
        ],
        Section::Technical => vec![
            "<li>Braki w optymalizacji technicznej strony. Do wykonania:".to_string(),
            "<ul>".to_string(),
            "<li>Popraw szybkość ładowania strony.</li>".to_string(),
            "<li>Upewnij się, że strona jest przyjazna dla urządzeń mobilnych.</li>".to_string(),
            "<li>Zweryfikuj, czy strona jest poprawnie zaindeksowana w wyszukiwarkach.</li>".to_string(),
            "</ul></li>".to_string(),
        ],
    }
}
