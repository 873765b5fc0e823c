use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Default Dhivehi corpus shipped with the trainer.
const BUILTIN_CORPUS: &str = "\
ހިތް ވަށް ރަށް ގެ ކަނޑު މީހާ ދުވަސް އަހަރު ރާއްޖެ ބަސް \
ފޮތް ކުދިން މަގު ވާހަކަ ރަނގަޅު ކިޔުން ލިޔުން ސްކޫލު ގޮތް ކަމެއް \
މަސް ބަތް ފެން ހަވީރު ހެނދުނު ރޭގަނޑު ދަތުރު އޮޑި ކަނޑުއޮޅި ރުއް \
ގަސް މާ ވިލު ފަޅު ރީތި ބޮޑު ކުޑަ އާ ބާ ހޫނު \
ފިނި ދިރިއުޅުން އާއިލާ މައިމަ ބައްޕަ ބޭބެ ދައްތަ ރަހުމަތްތެރި ކުޅިވަރު ހަދިޔާ \
ދިވެހި ތާނަ އަކުރު ބަހުރުވަ ޤައުމު ސަރުކާރު މުދަރިސް ދަރިވަރު ކިޔަވައިދިނުން ވަގުތު \
ހަފްތާ މަހު ދުނިޔެ ވައި ވާރޭ އިރު ހަނދު ތަރި ރާޅު ފަރު";

#[derive(Debug, Error, PartialEq)]
pub enum WordPoolError {
    #[error("Word corpus is empty")]
    EmptyCorpus,
}

/// Corpus of candidate words from which tests are generated.
#[derive(Debug, Clone)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    pub fn new(words: Vec<String>) -> Result<Self, WordPoolError> {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Err(WordPoolError::EmptyCorpus);
        }

        Ok(Self { words })
    }

    /// Builds a pool from whitespace separated text, e.g. the contents of a
    /// word list file.
    pub fn from_text(text: &str) -> Result<Self, WordPoolError> {
        Self::new(text.split_whitespace().map(str::to_string).collect())
    }

    pub fn builtin() -> Self {
        Self {
            words: BUILTIN_CORPUS
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn sample(&self, count: usize) -> Vec<String> {
        self.sample_with(count, &mut rand::rng())
    }

    /// Draws `count` words in uniformly random order.
    ///
    /// Words are drawn without replacement within one pass over the corpus.
    /// When `count` exceeds the corpus size the pool is reshuffled and a new
    /// pass begins, so the result always holds exactly `count` words.
    pub fn sample_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<String> {
        let mut sampled = Vec::with_capacity(count);

        while sampled.len() < count {
            let mut pass: Vec<&String> = self.words.iter().collect();
            pass.shuffle(rng);

            let needed = count - sampled.len();
            sampled.extend(pass.into_iter().take(needed).cloned());
        }

        sampled
    }
}

impl Default for WordPool {
    fn default() -> Self {
        Self::builtin()
    }
}
