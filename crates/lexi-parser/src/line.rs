use lexi_core::{EntryMetadata, NewEntry, contains_cjk};

const FULLWIDTH_COMMA: char = '，';

/// Parse one line of a word list.
///
/// Delimiters are tried in order: tab, comma (quote aware), full-width comma.
/// The first one producing at least two non-empty fields wins. Lines that do
/// not reach two fields yield `None`.
pub fn parse_line(line: &str) -> Option<NewEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fields = split_fields(line)?;
    let word = &fields[0];

    let mut metadata = EntryMetadata::default();
    let mut translation = Vec::with_capacity(fields.len() - 1);
    for (index, field) in fields.iter().enumerate().skip(1) {
        if index == 2 && contains_cjk(field) {
            metadata = metadata.with_root_script(field);
        } else {
            translation.push(field.as_str());
        }
    }

    let entry = NewEntry::new(word, translation.join(", ")).with_metadata(metadata);
    entry.has_word().then_some(entry)
}

fn split_fields(line: &str) -> Option<Vec<String>> {
    let splitters: [fn(&str) -> Vec<String>; 3] = [split_tab, split_csv, split_fullwidth];

    splitters.iter().find_map(|split| {
        let fields: Vec<String> = split(line)
            .into_iter()
            .map(|f| dequote(&f))
            .filter(|f| !f.is_empty())
            .collect();
        (fields.len() >= 2).then_some(fields)
    })
}

fn split_tab(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}

fn split_fullwidth(line: &str) -> Vec<String> {
    line.split(FULLWIDTH_COMMA).map(str::to_string).collect()
}

/// Comma split that keeps commas inside `"..."`; `""` inside quotes is a
/// literal quote
fn split_csv(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn dequote(field: &str) -> String {
    let field = field.trim();
    match field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\"").trim().to_string(),
        None => field.to_string(),
    }
}
