/// The open pages of one browser and which one is active
pub struct PageManager<P> {
    pages: Vec<P>,
    active: Option<usize>,
}

impl<P> Default for PageManager<P> {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            active: None,
        }
    }
}

impl<P> PageManager<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly opened page and make it active
    pub fn add(&mut self, page: P) -> &P {
        self.pages.push(page);
        let index = self.pages.len() - 1;
        self.active = Some(index);
        &self.pages[index]
    }

    pub fn active(&self) -> Option<&P> {
        self.active.and_then(|i| self.pages.get(i))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Make the page at `index` active; false if there is none
    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.pages.len() {
            self.active = Some(index);
            true
        } else {
            false
        }
    }

    /// Stop tracking the page at `index`
    ///
    /// If it was active, the page before it (or the new first page) takes over.
    pub fn remove(&mut self, index: usize) -> Option<P> {
        if index >= self.pages.len() {
            return None;
        }
        let page = self.pages.remove(index);

        self.active = match self.active {
            _ if self.pages.is_empty() => None,
            Some(a) if a > index => Some(a - 1),
            Some(a) if a == index => Some(index.saturating_sub(1)),
            other => other,
        };

        Some(page)
    }

    pub fn pages(&self) -> &[P] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
#[path = "page_manager_test.rs"]
mod page_manager_test;
