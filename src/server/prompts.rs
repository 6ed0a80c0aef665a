//! Prompt templates served over `prompts/get`
//!
//! Each template is a single user message that steers the model through a
//! sequence of tool calls. None of them take arguments.

use crate::mcp::protocol::{Content, GetPromptResult, PromptInfo, PromptMessage};

pub struct Prompt {
    pub name: &'static str,
    pub description: &'static str,
    template: &'static str,
}

impl Prompt {
    pub fn info(&self) -> PromptInfo {
        PromptInfo {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
        }
    }

    pub fn render(&self) -> GetPromptResult {
        GetPromptResult {
            description: Some(self.description.to_string()),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: Content::text(self.template.trim()),
            }],
        }
    }
}

const MINUTES: &str = "
Produce the minutes for one meeting.
If it is not clear which meeting is meant, ask the user for its topic first.
Call 'get_meeting_details' with that topic, then present the result in a
readable layout headed 'Meeting Minutes for: <topic>'.
";

const KICKOFF: &str = "
Set up a kickoff meeting for a new project.
1. Ask the user for the project name; it becomes the meeting topic.
2. Call 'schedule_meeting' with that topic.
3. Call 'add_attendee' twice to add 'Project Manager' and 'Lead Engineer'.
4. Call 'add_action_item' with the item 'Finalize project scope and charter.'
5. Tell the user the kickoff meeting is ready and what it contains.
";

const FORMAT: &str = "
Write a Markdown report covering every scheduled meeting.
1. Call 'list_all_meetings' to get the topics.
2. If there are none, tell the user the list is empty and stop.
3. Call 'get_meeting_details' once per topic.
4. Once everything is gathered, emit one Markdown document that starts with
   '# Meeting Report' and has a '## Meeting: <topic>' section per meeting,
   listing 'Attendees' and 'Action Items' as bullet points.
";

const DEMO: &str = "
Fill the assistant with sample data. Perform these calls in order:
1. 'schedule_meeting' for \"Q3 Financial Review\", \"Project Alpha Sync\" and
   \"Marketing Brainstorm\".
2. For \"Q3 Financial Review\": 'add_attendee' \"Alice\" and \"Bob\", then
   'add_action_item' \"Finalize revenue report\".
3. For \"Project Alpha Sync\": 'add_attendee' \"Charlie\" and \"Dana\", then
   'add_action_item' \"Update project timeline\" and
   \"Resolve blocking issue #123\".
4. For \"Marketing Brainstorm\": 'add_attendee' \"Eve\", then
   'add_action_item' \"Draft new ad campaign slogans\".
When every call has completed, reply with exactly:
\"Demo data has been successfully created.\"
";

pub static PROMPTS: &[Prompt] = &[
    Prompt {
        name: "minutes",
        description: "Generate meeting minutes from the details.",
        template: MINUTES,
    },
    Prompt {
        name: "kickoff",
        description: "Plan a new project kickoff meeting.",
        template: KICKOFF,
    },
    Prompt {
        name: "format",
        description: "Format all meetings into a markdown report.",
        template: FORMAT,
    },
    Prompt {
        name: "demo",
        description: "Populate the server with random meeting data for a demo.",
        template: DEMO,
    },
];

pub fn find(name: &str) -> Option<&'static Prompt> {
    PROMPTS.iter().find(|p| p.name == name)
}
