//! Property-based tests for the wire codec.

use chrono::{NaiveDate, NaiveTime};
use huddle_proto::{
    ChannelData, ChannelEntry, ChatMessage, Event, Header, HistoryEntry, Outbound, Request,
    Response, SearchQuery, Status, WorkspaceList,
};
use proptest::{option, prelude::*};

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=28).prop_filter_map("valid date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

fn arb_time() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60, 0u32..60)
        .prop_filter_map("valid time", |(h, m, s)| NaiveTime::from_hms_opt(h, m, s))
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,11}"
}

fn arb_text() -> impl Strategy<Value = String> {
    "\\PC{0,40}"
}

fn arb_header() -> impl Strategy<Value = Header> {
    (arb_date(), arb_time(), arb_text()).prop_map(|(date, time, sender)| Header {
        date,
        time,
        sender,
    })
}

fn arb_query() -> impl Strategy<Value = SearchQuery> {
    (
        option::of(arb_text()),
        option::of(arb_name()),
        option::of(arb_name()),
        option::of(arb_text()),
        option::of(arb_date()),
        option::of(arb_date()),
    )
        .prop_map(|(query, workspace, channel, sender, date_from, date_to)| SearchQuery {
            query,
            workspace,
            channel,
            sender,
            date_from,
            date_to,
        })
}

fn arb_request() -> impl Strategy<Value = Request> {
    prop_oneof![
        (arb_name(), arb_name())
            .prop_map(|(workspace, channel)| Request::GetChannelData { workspace, channel }),
        Just(Request::GetWorkspaceList),
        arb_name().prop_map(|workspace| Request::GetChannelList { workspace }),
        (arb_name(), arb_name(), arb_text()).prop_map(|(workspace, channel, body)| {
            Request::SendMessage { workspace, channel, body }
        }),
        arb_text().prop_map(|username| Request::RegisterUser { username }),
        arb_name().prop_map(|workspace_name| Request::CreateWorkspace { workspace_name }),
        arb_name().prop_map(|workspace| Request::DeleteWorkspace { workspace }),
        (arb_name(), arb_name(), arb_text()).prop_map(|(workspace, channel_name, description)| {
            Request::CreateChannel { workspace, channel_name, description }
        }),
        (arb_name(), arb_name())
            .prop_map(|(workspace, channel)| Request::DeleteChannel { workspace, channel }),
        arb_query().prop_map(Request::Search),
    ]
}

fn arb_entry() -> impl Strategy<Value = ChannelEntry> {
    prop_oneof![
        arb_name().prop_map(ChannelEntry::Name),
        (arb_name(), option::of(arb_text()))
            .prop_map(|(name, description)| ChannelEntry::Detailed { name, description }),
    ]
}

fn arb_history() -> impl Strategy<Value = HistoryEntry> {
    (arb_date(), arb_time(), arb_text(), arb_text())
        .prop_map(|(date, time, sender, body)| HistoryEntry { date, time, sender, body })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (arb_header(), option::of(arb_name()), arb_name(), prop::collection::vec(arb_history(), 0..6))
            .prop_map(|(header, workspace, channel, messages)| {
                Event::ChannelData(ChannelData { header, workspace, channel, messages })
            }),
        (arb_header(), prop::collection::vec((arb_name(), prop::collection::vec(arb_entry(), 0..4)), 0..5))
            .prop_map(|(header, pairs)| {
                Event::WorkspaceList(WorkspaceList { header, workspaces: pairs.into_iter().collect() })
            }),
        (arb_header(), "[a-z_]{1,12}", any::<bool>(), arb_text()).prop_map(
            |(header, stem, ok, message)| {
                Event::Response(Response {
                    header,
                    action: format!("x_{stem}_response"),
                    status: if ok { Status::Success } else { Status::Failure("error".into()) },
                    message,
                })
            }
        ),
        (
            arb_header(),
            option::of("custom_[a-z]{1,8}"),
            option::of(arb_name()),
            option::of(arb_name()),
            arb_text()
        )
            .prop_map(|(header, action, workspace, channel, body)| {
                Event::Chat(ChatMessage { header, action, workspace, channel, body })
            }),
    ]
}

proptest! {
    #[test]
    fn prop_request_round_trip(header in arb_header(), request in arb_request()) {
        let outbound = Outbound::new(header, request);
        let text = outbound.encode().unwrap();
        let decoded = Outbound::decode(&text).unwrap();

        prop_assert_eq!(decoded, outbound);
    }

    #[test]
    fn prop_request_is_one_flat_object(header in arb_header(), request in arb_request()) {
        let action = request.action();
        let text = Outbound::new(header, request).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let object = value.as_object().unwrap();

        prop_assert_eq!(object.get("action").and_then(|v| v.as_str()), Some(action));
        for key in ["date", "time", "sender"] {
            prop_assert!(object.get(key).is_some_and(serde_json::Value::is_string));
        }
    }

    #[test]
    fn prop_event_round_trip(event in arb_event()) {
        let text = event.encode().unwrap();
        let decoded = Event::decode(&text).unwrap();

        prop_assert_eq!(decoded, event);
    }

    #[test]
    fn prop_decode_never_panics(text in "\\PC{0,200}") {
        let _ = Event::decode(&text);
    }

    #[test]
    fn prop_unknown_action_is_chat(header in arb_header(), tag in "zz_[a-z]{1,10}", body in arb_text()) {
        let mut value = serde_json::to_value(&header).unwrap();
        value["action"] = tag.clone().into();
        value["message"] = body.clone().into();

        let event = Event::decode(&value.to_string()).unwrap();
        let Event::Chat(chat) = event else {
            return Err(TestCaseError::fail("expected chat"));
        };
        prop_assert_eq!(chat.action, Some(tag));
        prop_assert_eq!(chat.body, body);
    }
}
