use crate::decl::Declaration;

/// Handle to a declaration stored in a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId(usize);

impl DeclId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Declarations in registration order.
///
/// Lookups are linear; the first matching declaration wins.
#[derive(Debug, Default)]
pub struct Registry<'a> {
    decls: Vec<Declaration<'a>>,
}

impl<'a> Registry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: Declaration<'a>) -> DeclId {
        self.decls.push(decl);
        DeclId(self.decls.len() - 1)
    }

    pub fn find_short(&self, c: char) -> Option<DeclId> {
        self.decls.iter().position(|d| d.matches_short(c)).map(DeclId)
    }

    pub fn find_long(&self, name: &str) -> Option<DeclId> {
        self.decls.iter().position(|d| d.matches_long(name)).map(DeclId)
    }

    pub fn find_dos(&self, name: &str) -> Option<DeclId> {
        self.decls.iter().position(|d| d.matches_dos(name)).map(DeclId)
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration<'a>> {
        self.decls.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration<'a>> {
        self.decls.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration<'a>> {
        self.decls.iter()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
