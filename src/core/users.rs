//! User id to user name mapping shared between the machine and its caller.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type SharedUsersTable = Rc<RefCell<UsersTable>>;

#[derive(Debug, Clone, Default)]
pub struct UsersTable {
    names: HashMap<u32, String>,
}

impl UsersTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the host's user accounts.
    pub fn load() -> Self {
        let mut table = Self::new();
        let users = sysinfo::Users::new_with_refreshed_list();
        for user in users.list() {
            #[cfg(unix)]
            table.insert(**user.id(), user.name());
            #[cfg(not(unix))]
            let _ = user;
        }
        table
    }

    pub fn shared(self) -> SharedUsersTable {
        Rc::new(RefCell::new(self))
    }

    pub fn insert<S: Into<String>>(&mut self, uid: u32, name: S) {
        self.names.insert(uid, name.into());
    }

    pub fn get(&self, uid: u32) -> Option<&str> {
        self.names.get(&uid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
