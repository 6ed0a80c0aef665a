//! Meeting record tools
//!
//! Application failures (unknown topic, duplicate topic) are reported as
//! error outputs, never as protocol errors.

use super::{string_params_schema, Tool, ToolOutput};
use crate::server::store::MeetingStore;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct TopicInput {
    topic: String,
}

#[derive(Debug, Deserialize)]
struct AttendeeInput {
    topic: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ActionItemInput {
    topic: String,
    item: String,
}

fn parse<T: for<'de> Deserialize<'de>>(input: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(input).map_err(|e| ToolOutput::error(format!("Invalid input: {e}")))
}

/// Create an empty meeting
pub struct ScheduleMeetingTool;

impl Tool for ScheduleMeetingTool {
    fn name(&self) -> &'static str {
        "schedule_meeting"
    }

    fn description(&self) -> String {
        "Schedules a new, empty meeting with a given topic.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_params_schema(
            self.name(),
            &[("topic", "The unique topic or title of the meeting.")],
        )
    }

    fn run(&self, input: Value, store: &mut MeetingStore) -> ToolOutput {
        let input: TopicInput = match parse(input) {
            Ok(input) => input,
            Err(output) => return output,
        };
        match store.schedule(&input.topic) {
            Ok(()) => ToolOutput::success(format!(
                "Successfully scheduled new meeting: '{}'",
                input.topic
            )),
            Err(e) => ToolOutput::error(format!("Error: {e}")),
        }
    }
}

pub struct AddAttendeeTool;

impl Tool for AddAttendeeTool {
    fn name(&self) -> &'static str {
        "add_attendee"
    }

    fn description(&self) -> String {
        "Adds an attendee to a specific meeting.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_params_schema(
            self.name(),
            &[
                ("topic", "The topic of the meeting to add an attendee to."),
                ("name", "The name of the person attending the meeting."),
            ],
        )
    }

    fn run(&self, input: Value, store: &mut MeetingStore) -> ToolOutput {
        let input: AttendeeInput = match parse(input) {
            Ok(input) => input,
            Err(output) => return output,
        };
        match store.add_attendee(&input.topic, &input.name) {
            Ok(()) => ToolOutput::success(format!(
                "Successfully added attendee '{}' to meeting '{}'.",
                input.name, input.topic
            )),
            Err(e) => ToolOutput::error(format!("Error: {e}")),
        }
    }
}

pub struct AddActionItemTool;

impl Tool for AddActionItemTool {
    fn name(&self) -> &'static str {
        "add_action_item"
    }

    fn description(&self) -> String {
        "Adds an action item to a specific meeting.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_params_schema(
            self.name(),
            &[
                ("topic", "The topic of the meeting for the action item."),
                ("item", "The description of the action item."),
            ],
        )
    }

    fn run(&self, input: Value, store: &mut MeetingStore) -> ToolOutput {
        let input: ActionItemInput = match parse(input) {
            Ok(input) => input,
            Err(output) => return output,
        };
        match store.add_action_item(&input.topic, &input.item) {
            Ok(()) => ToolOutput::success(format!(
                "Successfully added action item to meeting '{}': '{}'",
                input.topic, input.item
            )),
            Err(e) => ToolOutput::error(format!("Error: {e}")),
        }
    }
}

pub struct GetMeetingDetailsTool;

impl Tool for GetMeetingDetailsTool {
    fn name(&self) -> &'static str {
        "get_meeting_details"
    }

    fn description(&self) -> String {
        "Retrieves the attendees and action items for a specific meeting.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_params_schema(
            self.name(),
            &[("topic", "The topic of the meeting to get details for.")],
        )
    }

    fn run(&self, input: Value, store: &mut MeetingStore) -> ToolOutput {
        let input: TopicInput = match parse(input) {
            Ok(input) => input,
            Err(output) => return output,
        };
        let Some(meeting) = store.get(&input.topic) else {
            return ToolOutput::error(format!("Error: Meeting '{}' not found.", input.topic));
        };

        let attendees = if meeting.attendees.is_empty() {
            "None".to_string()
        } else {
            meeting.attendees.join(", ")
        };
        let action_items = if meeting.action_items.is_empty() {
            "No action items.".to_string()
        } else {
            meeting
                .action_items
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        ToolOutput::success(format!(
            "Details for meeting '{}':\nAttendees: {attendees}\nAction Items:\n{action_items}",
            input.topic
        ))
    }
}

pub struct ListAllMeetingsTool;

impl Tool for ListAllMeetingsTool {
    fn name(&self) -> &'static str {
        "list_all_meetings"
    }

    fn description(&self) -> String {
        "Lists the topics of all currently scheduled meetings.".to_string()
    }

    fn input_schema(&self) -> Value {
        string_params_schema(self.name(), &[])
    }

    fn run(&self, _input: Value, store: &mut MeetingStore) -> ToolOutput {
        if store.is_empty() {
            return ToolOutput::success("There are no meetings scheduled at the moment.");
        }
        ToolOutput::success(store.topics().collect::<Vec<_>>().join("\n"))
    }
}
