use slotmap::SlotMap;
use tracing::trace;

use crate::common::collections::HashMap;
use crate::common::config::Config;
use crate::model::client::{Client, ClientId, WindowHandle, WindowInfo};
use crate::model::desktop::Desktop;
use crate::model::focus::{self, FocusUpdate};

/// The whole in-memory state of the window manager: every client record,
/// every desktop, and which desktop is active.
///
/// Clients live in one arena; a desktop's sequence refers to them by slot id.
/// Every client is a member of exactly one desktop's sequence, so moving a
/// window between desktops is a transfer of its id, never a copy.
#[derive(Debug)]
pub struct Workspace {
    clients: SlotMap<ClientId, Client>,
    handles: HashMap<WindowHandle, ClientId>,
    pub desktops: Vec<Desktop>,
    pub current_desktop: usize,
    pub previous_desktop: usize,
}

impl Workspace {
    pub fn new(config: &Config) -> Self {
        let desktops = config
            .desktops
            .iter()
            .map(|d| {
                Desktop::new(
                    d.name.clone(),
                    d.mode,
                    d.master_fraction,
                    d.master_count,
                    d.show_panel,
                )
            })
            .collect();
        Self {
            clients: SlotMap::with_key(),
            handles: HashMap::default(),
            desktops,
            current_desktop: 0,
            previous_desktop: 0,
        }
    }

    pub fn clients(&self) -> &SlotMap<ClientId, Client> {
        &self.clients
    }

    pub fn client(&self, id: ClientId) -> &Client {
        &self.clients[id]
    }

    pub fn client_mut(&mut self, id: ClientId) -> &mut Client {
        &mut self.clients[id]
    }

    pub fn get_client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id)
    }

    pub fn desktop(&self, index: usize) -> &Desktop {
        &self.desktops[index]
    }

    pub fn desktop_mut(&mut self, index: usize) -> &mut Desktop {
        &mut self.desktops[index]
    }

    pub fn active_desktop(&self) -> &Desktop {
        &self.desktops[self.current_desktop]
    }

    pub fn active_desktop_mut(&mut self) -> &mut Desktop {
        &mut self.desktops[self.current_desktop]
    }

    /// Which client, on which desktop, the given server handle refers to.
    pub fn find_window(&self, handle: WindowHandle) -> Option<(usize, ClientId)> {
        let id = *self.handles.get(&handle)?;
        let desktop = self.desktop_of(id)?;
        Some((desktop, id))
    }

    pub fn desktop_of(&self, id: ClientId) -> Option<usize> {
        self.desktops.iter().position(|d| d.contains(id))
    }

    /// Create a client record for a newly mapped window and link it into the
    /// given desktop's sequence.
    pub fn create_client(
        &mut self,
        desktop: usize,
        handle: WindowHandle,
        info: &WindowInfo,
        border_width: i32,
        at_end: bool,
    ) -> ClientId {
        let id = self.clients.insert(Client::new(handle, info, border_width));
        self.handles.insert(handle, id);
        self.desktops[desktop].attach(id, at_end);
        trace!(?handle, desktop, "created client");
        id
    }

    /// Unlink a client from its desktop and drop its record. Returns the
    /// record for any final bookkeeping. The caller owns the refocus/retile
    /// obligations.
    pub fn remove_client(&mut self, id: ClientId) -> Option<Client> {
        let desktop = self.desktop_of(id)?;
        self.desktops[desktop].detach(id);
        let client = self.clients.remove(id)?;
        self.handles.remove(&client.handle);
        trace!(handle = ?client.handle, desktop, "removed client");
        Some(client)
    }

    /// Move a client between desktops. The destination gains the window
    /// before the source's focus references are touched, so no intermediate
    /// state ever has the client unreachable.
    pub fn transfer(&mut self, from: usize, to: usize, id: ClientId, at_end: bool) {
        debug_assert!(self.desktops[from].contains(id));
        self.desktops[to].attach(id, at_end);
        self.desktops[from].detach(id);
    }

    /// Focus `target` on the given desktop, updating the desktop's
    /// references and returning the directives the collaborator needs.
    pub fn focus(&mut self, desktop: usize, target: Option<ClientId>) -> FocusUpdate {
        focus::apply_focus(&mut self.clients, &mut self.desktops[desktop], target)
    }

    /// Every managed handle, desktop by desktop in sequence order. This is
    /// the client-list property value.
    pub fn all_handles(&self) -> Vec<WindowHandle> {
        self.desktops
            .iter()
            .flat_map(|d| d.order().iter().map(|&id| self.clients[id].handle))
            .collect()
    }

    /// First urgent client, searching the active desktop before the others.
    pub fn find_urgent(&self) -> Option<(usize, ClientId)> {
        let active = self.current_desktop;
        let in_desktop = |idx: usize| {
            self.desktops[idx]
                .order()
                .iter()
                .copied()
                .find(|&id| self.clients[id].urgent)
                .map(|id| (idx, id))
        };
        in_desktop(active).or_else(|| (0..self.desktops.len()).filter(|&i| i != active).find_map(in_desktop))
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
