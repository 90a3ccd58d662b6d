use crc32fast::Hasher;

/// Generate a short document seed from a page identifier using CRC32
pub fn get_page_seed(page_id: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(format!("page://{}", page_id).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Source of fresh block ids
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

impl<F: FnMut() -> String> IdSource for F {
    fn next_id(&mut self) -> String {
        self()
    }
}

/// Sequential ID generator for blocks within a page
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(page_id: &str) -> Self {
        Self::from_seed(get_page_seed(page_id))
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Skip past any ids already present so restored documents never collide
    /// with freshly generated ones.
    pub fn observe<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let prefix = format!("{}-", self.seed);
        for id in ids {
            if let Some(n) = id.strip_prefix(&prefix).and_then(|n| n.parse::<u64>().ok()) {
                self.count = self.count.max(n);
            }
        }
    }

    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl IdSource for IdGenerator {
    fn next_id(&mut self) -> String {
        self.new_id()
    }
}
