//! Page snapshots resembling the hosts the agent runs on.

use eisenhower_rs_dom::Document;

pub const OWA_URL: &str = "https://outlook.office.com/mail/inbox";

/// A mail list with one selected row and an open reading pane.
pub const OWA_INBOX: &str = r#"<html>
<head><title>Mail - Outlook</title></head>
<body>
  <div class="customScrollBar" role="listbox" aria-label="Message list">
    <div role="row" data-convid="AAQkADA1" aria-selected="true"
         aria-label="Jane Doe; Project Kickoff Meeting Notes; 14:02; Unread">
      <span>Jane Doe</span><span title="2025-05-02 14:02">14:02</span>
    </div>
    <div role="row" data-convid="AAQkADA2"
         aria-label="Build Bot; [OPS-7] Broken build on main; Tue 09:15">
      <span>Build Bot</span><span title="2025-04-29 09:15">Tue 09:15</span>
    </div>
    <div role="row" data-convid="AAQkADA3"
         aria-label="John Roe; Invoice for April services; 2025-04-28">
      <span>John Roe</span><span title="2025-04-28 11:40">2025-04-28</span>
    </div>
  </div>
  <div role="main">
    <div class="_rp_o1 ItemHeader">
      <span class="_rp_32">Fri 2025-05-02 14:02</span>
      <span>Jane Doe</span>
    </div>
    <div class="allowTextSelection">Hi team, the kickoff notes are attached.</div>
  </div>
</body>
</html>"#;

pub const JIRA_URL: &str = "https://jira.example.com/browse/OPS-7";

/// An issue page with the summary heading most trackers render.
pub const JIRA_ISSUE: &str = r#"<html>
<head><title>[OPS-7] Broken build on main - Jira</title></head>
<body>
  <header class="aui-page-header">
    <div class="aui-page-header-main">
      <h1 id="summary-val">Broken build on main Click to edit</h1>
    </div>
  </header>
  <div role="main"><p>The nightly pipeline fails at the lint step.</p></div>
</body>
</html>"#;

pub fn owa_inbox() -> Document {
    Document::parse_html_with_url(OWA_INBOX, OWA_URL).unwrap_or_else(|err| panic!("fixture: {err}"))
}

pub fn jira_issue() -> Document {
    Document::parse_html_with_url(JIRA_ISSUE, JIRA_URL).unwrap_or_else(|err| panic!("fixture: {err}"))
}
