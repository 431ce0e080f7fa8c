//! Remote call bookkeeping. Every call gets a sequence number; only the
//! newest call of each kind may complete, older completions are stale.

use peakview_protocol::{PlotRequest, SearchRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Search,
    Plot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub seq: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "lowercase")]
pub enum RemoteCall {
    Search(SearchRequest),
    Plot(PlotRequest),
}

impl RemoteCall {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Search(_) => RequestKind::Search,
            Self::Plot(_) => RequestKind::Plot,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Plot(_) => "plot",
        }
    }
}

/// A call handed to the transport, waiting for its completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub call: RemoteCall,
}

#[derive(Debug, Default, Clone)]
pub struct Dispatcher {
    next_seq: u64,
    latest_search: Option<u64>,
    latest_plot: Option<u64>,
    issued: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn latest_mut(&mut self, kind: RequestKind) -> &mut Option<u64> {
        match kind {
            RequestKind::Search => &mut self.latest_search,
            RequestKind::Plot => &mut self.latest_plot,
        }
    }

    fn latest(&self, kind: RequestKind) -> Option<u64> {
        match kind {
            RequestKind::Search => self.latest_search,
            RequestKind::Plot => self.latest_plot,
        }
    }

    /// Issues `call`, superseding any outstanding call of the same kind.
    pub fn issue(&mut self, call: RemoteCall) -> PendingRequest {
        self.next_seq += 1;
        self.issued += 1;
        let ticket = RequestTicket {
            kind: call.kind(),
            seq: self.next_seq,
        };
        if let Some(previous) = self.latest_mut(ticket.kind).replace(ticket.seq) {
            debug!(
                call = call.name(),
                superseded = previous,
                seq = ticket.seq,
                "superseding outstanding request"
            );
        } else {
            debug!(call = call.name(), seq = ticket.seq, "issuing request");
        }
        PendingRequest { ticket, call }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest(ticket.kind) == Some(ticket.seq)
    }

    /// Marks `ticket` completed. Returns false for stale or unknown tickets,
    /// which must then be ignored.
    pub fn settle(&mut self, ticket: RequestTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        *self.latest_mut(ticket.kind) = None;
        true
    }

    pub fn in_flight(&self, kind: RequestKind) -> bool {
        self.latest(kind).is_some()
    }

    /// Invalidates the outstanding call of `kind`, if any.
    pub fn cancel(&mut self, kind: RequestKind) -> Option<RequestTicket> {
        self.latest_mut(kind)
            .take()
            .map(|seq| RequestTicket { kind, seq })
    }

    /// Number of calls handed out so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }
}
