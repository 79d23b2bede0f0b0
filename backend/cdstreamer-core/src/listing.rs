//! Directory listing pages, serialized into the user data area of a single sector
//!
//! Page layout:
//! - Zero or more entry records: `[name length (1-255)] [name bytes] [kind: 0 file, 1 directory]`
//! - One terminator: `[0x00] [has more: 0/1] [total count, u16 LE, 0xFFFF if unknown]`
//! - Zero padding up to the end of the page


pub const LISTING_PAGE_LEN: usize = cdrom::MODE2_FORM2_DATA_LEN;

pub const MAX_NAME_LEN: usize = 255;

pub const UNKNOWN_TOTAL: u16 = 0xFFFF;

const TERMINATOR_LEN: usize = 4;

const KIND_FILE: u8 = 0;
const KIND_DIRECTORY: u8 = 1;

pub type ListingPage = [u8; LISTING_PAGE_LEN];

#[derive(Debug, Clone)]
pub struct ListingPageBuilder {
    buffer: Box<ListingPage>,
    position: usize,
    entry_count: usize,
    terminated: bool,
}

impl ListingPageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Box::new([0; LISTING_PAGE_LEN]),
            position: 0,
            entry_count: 0,
            terminated: false,
        }
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
        self.position = 0;
        self.entry_count = 0;
        self.terminated = false;
    }

    /// Append an entry. Returns false and leaves the page untouched if the entry does not fit
    /// (room for the terminator is always kept), if the name is empty, or if the page has already
    /// been terminated. Names longer than 255 bytes are cut at the last character boundary that
    /// fits.
    pub fn add_entry(&mut self, name: &str, is_directory: bool) -> bool {
        if self.terminated || name.is_empty() {
            return false;
        }

        let name = truncate_name(name);
        let record_len = 1 + name.len() + 1;
        if self.position + record_len + TERMINATOR_LEN > LISTING_PAGE_LEN {
            return false;
        }

        let record = &mut self.buffer[self.position..self.position + record_len];
        record[0] = name.len() as u8;
        record[1..=name.len()].copy_from_slice(name.as_bytes());
        record[name.len() + 1] = if is_directory { KIND_DIRECTORY } else { KIND_FILE };

        self.position += record_len;
        self.entry_count += 1;

        true
    }

    /// Terminate the page. Always succeeds; a second call overwrites the first terminator.
    pub fn add_terminator(&mut self, has_more: bool, total_count: Option<u16>) {
        let [count_lsb, count_msb] = total_count.unwrap_or(UNKNOWN_TOTAL).to_le_bytes();
        self.buffer[self.position..self.position + TERMINATOR_LEN].copy_from_slice(&[
            0x00,
            has_more.into(),
            count_lsb,
            count_msb,
        ]);
        self.terminated = true;
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// The finished page, or `None` if no terminator has been written since the last clear.
    #[must_use]
    pub fn page(&self) -> Option<&ListingPage> {
        self.terminated.then_some(&*self.buffer)
    }
}

impl Default for ListingPageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }

    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub name: String,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub entries: Vec<PageEntry>,
    pub has_more: bool,
    pub total_count: Option<u16>,
}

/// Parse a listing page the way the console-side browser reads it. Returns `None` if the page is
/// truncated or malformed.
#[must_use]
pub fn parse_page(page: &[u8]) -> Option<ParsedPage> {
    let mut entries = Vec::new();
    let mut position = 0;

    loop {
        let name_len = usize::from(*page.get(position)?);
        if name_len == 0 {
            let has_more = *page.get(position + 1)? != 0;
            let total_count =
                u16::from_le_bytes([*page.get(position + 2)?, *page.get(position + 3)?]);
            let total_count = (total_count != UNKNOWN_TOTAL).then_some(total_count);
            return Some(ParsedPage { entries, has_more, total_count });
        }

        let name = page.get(position + 1..position + 1 + name_len)?;
        let kind = *page.get(position + 1 + name_len)?;
        let is_directory = match kind {
            KIND_FILE => false,
            KIND_DIRECTORY => true,
            _ => return None,
        };

        entries.push(PageEntry { name: String::from_utf8_lossy(name).into_owned(), is_directory });
        position += name_len + 2;
    }
}
