use lexi_core::LemmaCandidates;

/// A guessed base form and the rule that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Inflection {
    pub base_form: String,
    pub rule: &'static str,
    pub confidence: f32,
}

const IRREGULAR: &[(&str, &str)] = &[
    ("am", "be"),
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("did", "do"),
    ("done", "do"),
    ("does", "do"),
    ("had", "have"),
    ("has", "have"),
    ("went", "go"),
    ("gone", "go"),
    ("ran", "run"),
    ("saw", "see"),
    ("seen", "see"),
    ("took", "take"),
    ("taken", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("ate", "eat"),
    ("eaten", "eat"),
    ("wrote", "write"),
    ("written", "write"),
    ("made", "make"),
    ("said", "say"),
    ("thought", "think"),
    ("brought", "bring"),
    ("bought", "buy"),
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("people", "person"),
];

/// Minimum length of anything offered as a base form
const MIN_STEM: usize = 2;

pub struct EnglishLemmatizer;

impl Default for EnglishLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EnglishLemmatizer {
    pub fn new() -> Self {
        Self
    }

    /// Possible base forms of `word`, most confident first
    pub fn inflections(&self, word: &str) -> Vec<Inflection> {
        let mut results = Vec::new();

        results.extend(self.irregular(word));
        results.extend(self.progressive(word));
        results.extend(self.past(word));
        results.extend(self.plural(word));
        results.extend(self.comparative(word));
        results.extend(self.adverb(word));

        results.retain(|r| r.base_form != word && r.base_form.chars().count() >= MIN_STEM);
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        results
    }

    fn irregular(&self, word: &str) -> Vec<Inflection> {
        IRREGULAR
            .iter()
            .filter(|(form, _)| *form == word)
            .map(|(_, base)| Inflection {
                base_form: base.to_string(),
                rule: "irregular",
                confidence: 1.0,
            })
            .collect()
    }

    /// running → run, walking → walk, making → make, dying → die
    fn progressive(&self, word: &str) -> Vec<Inflection> {
        let mut results = Vec::new();
        let Some(stem) = word.strip_suffix("ing") else {
            return results;
        };

        if let Some(base) = stem.strip_suffix('y') {
            results.push(inflection(format!("{base}ie"), "-ing after ie", 0.6));
        }
        if let Some(base) = undouble(stem) {
            results.push(inflection(base, "-ing with doubled consonant", 0.8));
        }
        results.push(inflection(stem.to_string(), "-ing", 0.7));
        results.push(inflection(format!("{stem}e"), "-ing dropping e", 0.6));
        results
    }

    /// stopped → stop, walked → walk, baked → bake, carried → carry
    fn past(&self, word: &str) -> Vec<Inflection> {
        let mut results = Vec::new();
        let Some(stem) = word.strip_suffix("ed") else {
            return results;
        };

        if let Some(base) = stem.strip_suffix('i') {
            results.push(inflection(format!("{base}y"), "-ied", 0.8));
        }
        if let Some(base) = undouble(stem) {
            results.push(inflection(base, "-ed with doubled consonant", 0.8));
        }
        results.push(inflection(stem.to_string(), "-ed", 0.7));
        results.push(inflection(format!("{stem}e"), "-d", 0.6));
        results
    }

    /// cities → city, boxes → box, wolves → wolf, cats → cat
    fn plural(&self, word: &str) -> Vec<Inflection> {
        let mut results = Vec::new();

        if let Some(stem) = word.strip_suffix("ies") {
            results.push(inflection(format!("{stem}y"), "-ies", 0.8));
        }
        if let Some(stem) = word.strip_suffix("ves") {
            results.push(inflection(format!("{stem}f"), "-ves", 0.5));
            results.push(inflection(format!("{stem}fe"), "-ves", 0.5));
        }
        if let Some(stem) = word.strip_suffix("es") {
            let sibilant = ["s", "x", "z", "ch", "sh"].iter().any(|s| stem.ends_with(s));
            results.push(inflection(stem.to_string(), "-es", if sibilant { 0.8 } else { 0.4 }));
        }
        if let Some(stem) = word.strip_suffix('s')
            && !stem.ends_with('s')
        {
            results.push(inflection(stem.to_string(), "-s", 0.7));
        }
        results
    }

    /// bigger → big, happiest → happy, taller → tall
    fn comparative(&self, word: &str) -> Vec<Inflection> {
        let mut results = Vec::new();
        for (suffix, rule) in [("er", "-er"), ("est", "-est")] {
            let Some(stem) = word.strip_suffix(suffix) else {
                continue;
            };
            if let Some(base) = stem.strip_suffix('i') {
                results.push(inflection(format!("{base}y"), rule, 0.5));
            }
            if let Some(base) = undouble(stem) {
                results.push(inflection(base, rule, 0.5));
            }
            results.push(inflection(stem.to_string(), rule, 0.4));
        }
        results
    }

    /// quickly → quick, happily → happy
    fn adverb(&self, word: &str) -> Vec<Inflection> {
        let mut results = Vec::new();
        if let Some(stem) = word.strip_suffix("ily") {
            results.push(inflection(format!("{stem}y"), "-ily", 0.5));
        }
        if let Some(stem) = word.strip_suffix("ly") {
            results.push(inflection(stem.to_string(), "-ly", 0.5));
        }
        results
    }
}

impl LemmaCandidates for EnglishLemmatizer {
    fn candidates(&self, word: &str, _language: &str) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for inflection in self.inflections(word) {
            if !seen.contains(&inflection.base_form) {
                seen.push(inflection.base_form);
            }
        }
        tracing::trace!("Lemma candidates for '{}': {:?}", word, seen);
        seen
    }
}

fn inflection(base_form: String, rule: &'static str, confidence: f32) -> Inflection {
    Inflection {
        base_form,
        rule,
        confidence,
    }
}

/// `runn` → `run`; letters that commonly double in base forms are left alone
fn undouble(stem: &str) -> Option<String> {
    let mut chars = stem.chars().rev();
    let last = chars.next()?;
    let before = chars.next()?;
    let doubles = last == before && last.is_ascii_alphabetic() && !"aeioulsfz".contains(last);
    doubles.then(|| stem[..stem.len() - last.len_utf8()].to_string())
}
