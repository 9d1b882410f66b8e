//! Property tests for the simulated server.
//!
//! Whatever the clients ask, the server's state stays well-formed and every
//! delivery is a frame the client codec accepts.

use chrono::NaiveDate;
use huddle_harness::SimServer;
use huddle_proto::{Event, Header, Outbound, Request, SearchQuery};
use proptest::prelude::*;

const WORKSPACES: &[&str] = &["acme", "home"];
const CHANNELS: &[&str] = &["general", "dev"];

fn name(pool: &'static [&'static str]) -> impl Strategy<Value = String> {
    prop::sample::select(pool).prop_map(str::to_owned)
}

fn request() -> impl Strategy<Value = Request> {
    prop_oneof![
        Just(Request::GetWorkspaceList),
        name(WORKSPACES).prop_map(|workspace| Request::GetChannelList { workspace }),
        (name(WORKSPACES), name(CHANNELS))
            .prop_map(|(workspace, channel)| Request::GetChannelData { workspace, channel }),
        (name(WORKSPACES), name(CHANNELS), "[a-z]{1,5}").prop_map(|(workspace, channel, body)| {
            Request::SendMessage { workspace, channel, body }
        }),
        name(WORKSPACES).prop_map(|workspace_name| Request::CreateWorkspace { workspace_name }),
        name(WORKSPACES).prop_map(|workspace| Request::DeleteWorkspace { workspace }),
        (name(WORKSPACES), name(CHANNELS)).prop_map(|(workspace, channel_name)| {
            Request::CreateChannel { workspace, channel_name, description: String::new() }
        }),
        (name(WORKSPACES), name(CHANNELS))
            .prop_map(|(workspace, channel)| Request::DeleteChannel { workspace, channel }),
        Just(Request::Search(SearchQuery::default())),
    ]
}

proptest! {
    #[test]
    fn deliveries_decode_and_names_stay_unique(requests in prop::collection::vec(request(), 0..40)) {
        let now = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let mut server = SimServer::new(now);

        for request in requests {
            let text = Outbound::new(Header::new("ana", now), request).encode().unwrap();
            for delivery in server.handle(&text) {
                prop_assert!(Event::decode(delivery.text()).is_ok());
            }

            let mut names = server.workspace_names();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            prop_assert_eq!(names.len(), total);
        }
    }
}
