// * Similarity Engine
// * TF-IDF vectors over page text and the pairwise cosine similarity matrix

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::config::TextSource;
use crate::persistence::schema::{Page, PageSet};

// * Maximal runs of word characters
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("Invalid token regex"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto",
    "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own",
    "part", "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Lowercased word tokens with English stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| !STOP_WORDS.contains(*token))
        .map(str::to_string)
        .collect()
}

/// Unigrams followed by bigrams of adjacent tokens
pub fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut terms = tokens.to_vec();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

/// Text fed to the vectorizer for one page
pub fn corpus_text(page: &Page, source: TextSource) -> String {
    match source {
        TextSource::Address => page.address.clone(),
        TextSource::Combined => {
            let mut parts = vec![page.address.as_str()];
            parts.extend(page.title.as_deref());
            parts.extend(page.h1.as_deref());
            parts.join(" ")
        }
    }
}

// * Sparse vector as (term index, weight), sorted by term index
type SparseVector = Vec<(usize, f64)>;

/// Fitted TF-IDF representation of a corpus
#[derive(Debug, Clone, Default)]
pub struct TfidfVectors {
    vocabulary: Vec<String>,
    vectors: Vec<SparseVector>,
}

impl TfidfVectors {
    /// Selected terms in column order (alphabetical)
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Cosine similarity of two documents; zero vectors are dissimilar to everything
    pub fn cosine(&self, i: usize, j: usize) -> f64 {
        let (a, b) = (&self.vectors[i], &self.vectors[j]);
        let (mut x, mut y, mut dot) = (0, 0, 0.0);
        while x < a.len() && y < b.len() {
            match a[x].0.cmp(&b[y].0) {
                std::cmp::Ordering::Less => x += 1,
                std::cmp::Ordering::Greater => y += 1,
                std::cmp::Ordering::Equal => {
                    dot += a[x].1 * b[y].1;
                    x += 1;
                    y += 1;
                }
            }
        }
        dot.clamp(0.0, 1.0)
    }
}

/// Term/bigram TF-IDF vectorizer with a vocabulary cap
///
/// Vocabulary: the `max_features` terms with the highest corpus frequency,
/// ties broken alphabetically. Weights are raw counts times smoothed idf
/// `ln((1 + n) / (1 + df)) + 1`, each vector scaled to unit length.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    pub fn fit_transform(&self, documents: &[String]) -> TfidfVectors {
        let counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| {
                let mut tf: HashMap<String, usize> = HashMap::new();
                for term in ngrams(&tokenize(doc)) {
                    *tf.entry(term).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        // * term -> (corpus count, document frequency)
        let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
        for tf in &counts {
            for (term, count) in tf {
                let entry = totals.entry(term.as_str()).or_insert((0, 0));
                entry.0 += count;
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> =
            totals.iter().map(|(term, (count, _))| (*term, *count)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut vocabulary: Vec<String> = ranked.iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();

        let n = documents.len() as f64;
        let columns: HashMap<&str, (usize, f64)> = vocabulary
            .iter()
            .enumerate()
            .map(|(col, term)| {
                let df = totals.get(term.as_str()).map_or(0, |t| t.1) as f64;
                let idf = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
                (term.as_str(), (col, idf))
            })
            .collect();

        let vectors = counts
            .iter()
            .map(|tf| {
                let mut vector: SparseVector = tf
                    .iter()
                    .filter_map(|(term, count)| {
                        columns
                            .get(term.as_str())
                            .map(|(col, idf)| (*col, *count as f64 * idf))
                    })
                    .collect();
                vector.sort_by_key(|(col, _)| *col);
                let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    vector.iter_mut().for_each(|(_, w)| *w /= norm);
                }
                vector
            })
            .collect();

        TfidfVectors {
            vocabulary,
            vectors,
        }
    }
}

/// Bijection between page addresses and matrix rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressIndex {
    addresses: Vec<String>,
    rows: HashMap<String, usize>,
}

impl AddressIndex {
    pub fn from_pages(pages: &PageSet) -> Self {
        let addresses: Vec<String> = pages.iter().map(|p| p.address.clone()).collect();
        let rows = addresses
            .iter()
            .enumerate()
            .map(|(row, addr)| (addr.clone(), row))
            .collect();
        Self { addresses, rows }
    }

    pub fn row_of(&self, address: &str) -> Option<usize> {
        self.rows.get(address).copied()
    }

    pub fn address_of(&self, row: usize) -> Option<&str> {
        self.addresses.get(row).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Dense symmetric cosine similarity matrix over all pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
    index: AddressIndex,
    vocabulary_size: usize,
}

impl SimilarityMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        (i < self.size && j < self.size).then(|| self.values[i * self.size + j])
    }

    /// Similarity between two pages looked up by address
    pub fn by_address(&self, a: &str, b: &str) -> Option<f64> {
        self.get(self.index.row_of(a)?, self.index.row_of(b)?)
    }

    pub fn index(&self) -> &AddressIndex {
        &self.index
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }
}

/// Builds the similarity matrix for a page set
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    vectorizer: TfidfVectorizer,
    text_source: TextSource,
}

impl SimilarityEngine {
    pub fn new(max_features: usize, text_source: TextSource) -> Self {
        Self {
            vectorizer: TfidfVectorizer::new(max_features),
            text_source,
        }
    }

    pub fn compute(&self, pages: &PageSet) -> SimilarityMatrix {
        let documents: Vec<String> = pages
            .iter()
            .map(|p| corpus_text(p, self.text_source))
            .collect();
        let tfidf = self.vectorizer.fit_transform(&documents);
        let size = documents.len();

        if size > 0 && tfidf.vocabulary().is_empty() {
            warn!(pages = size, "Empty vocabulary; similarity falls back to identity");
        }

        let mut values = vec![0.0; size * size];
        for i in 0..size {
            values[i * size + i] = 1.0;
            for j in (i + 1)..size {
                let sim = tfidf.cosine(i, j);
                values[i * size + j] = sim;
                values[j * size + i] = sim;
            }
        }

        debug!(
            pages = size,
            vocabulary = tfidf.vocabulary().len(),
            "Similarity matrix computed"
        );

        SimilarityMatrix {
            size,
            values,
            index: AddressIndex::from_pages(pages),
            vocabulary_size: tfidf.vocabulary().len(),
        }
    }
}
