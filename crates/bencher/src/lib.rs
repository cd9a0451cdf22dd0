/// A named benchmark input, grouped by its rough size.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, file: TestFile) -> Self {
        Self { name, group, file }
    }

    pub fn small(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Small, file)
    }

    pub fn large(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Large, file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    /// Size of the input, for throughput reporting.
    pub fn len(&self) -> u64 {
        self.file.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.file.content.is_empty()
    }
}

/// A raw fixture embedded at compile time.
///
/// Fixtures are stored with `\n` line endings, [`TestFile::to_wire`] converts them to what a
/// client actually sends.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// Returns the fixture with `\r\n` line endings in the header section.
    ///
    /// The body, everything after the first blank line, is kept byte for byte.
    pub fn to_wire(&self) -> Vec<u8> {
        let (head, body) = self.content.split_once("\n\n").unwrap_or((self.content, ""));

        let mut wire = Vec::with_capacity(self.content.len() + head.lines().count() + 2);
        for line in head.lines() {
            wire.extend_from_slice(line.as_bytes());
            wire.extend_from_slice(b"\r\n");
        }
        wire.extend_from_slice(b"\r\n");
        wire.extend_from_slice(body.as_bytes());
        wire
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}
