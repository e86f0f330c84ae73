//! The NGO workspace: events and the attendance taken at them.

use std::collections::BTreeSet;

use log::info;

use super::form::{self, Menu};
use super::{Ctx, Transition, UiError};
use crate::api::{Attendance, Class, College, Event, Ngo, NewEvent, Ref};
use crate::nav::Route;
use crate::util;

fn describe_date(ctx: &Ctx<'_>, event: &Event) -> String {
    match &event.event_date {
        Some(date) => util::format_event_date(date, ctx.time_zone),
        None => "no date".to_string(),
    }
}

enum EventsAction {
    Open(Event),
    Add,
    Logout,
}

pub async fn events(ctx: &mut Ctx<'_>, ngo: &Ngo) -> Result<Transition, UiError> {
    let events = match ctx.backend.events().await {
        Ok(events) => events,
        Err(err) => {
            ctx.report("Failed to load events", &err);
            vec![]
        }
    };

    let mut menu = Menu::new();
    if events.is_empty() {
        ctx.prompt.show("No events yet.");
    }
    for event in events {
        let date = describe_date(ctx, &event);
        let label = format!("{} ({}, {date})", event.aim, event.location);
        menu.push(label, EventsAction::Open(event));
    }
    menu.push("Add event", EventsAction::Add);
    menu.push("Logout", EventsAction::Logout);

    Ok(match menu.choose(ctx.prompt)? {
        Some(EventsAction::Open(event)) => Transition::Navigate(Route::EventInfo { event }),
        Some(EventsAction::Add) => {
            add_event(ctx, ngo).await?;
            Transition::Stay
        }
        Some(EventsAction::Logout) => ctx.logout().await,
        None => Transition::Back,
    })
}

async fn add_event(ctx: &mut Ctx<'_>, ngo: &Ngo) -> Result<(), UiError> {
    let labels = ["Aim", "Location", "Description", "Image url", "Date (YYYY-MM-DD HH:MM)"];
    let Some([aim, location, description, images, date]) = form::fields(ctx.prompt, labels)? else {
        return Ok(());
    };

    if aim.is_empty() || location.is_empty() || date.is_empty() {
        ctx.prompt.alert("Error", "Please fill in aim, location and date");
        return Ok(());
    }
    let event_date = match util::parse_event_date(&date, ctx.time_zone) {
        Ok(time) => time,
        Err(err) => {
            ctx.report("Invalid date", &err);
            return Ok(());
        }
    };

    let event = NewEvent {
        location,
        aim,
        description,
        images,
        event_date: event_date.to_string(),
    };
    match ctx.backend.add_event(&event).await {
        Ok(()) => {
            info!("{} added event {:?}", ngo.name, event.aim);
            ctx.prompt.alert("Success", "Event added");
        }
        Err(err) => ctx.report("Failed to add event", &err),
    }
    Ok(())
}

enum InfoAction {
    MarkAttendance,
    Records,
}

pub async fn event_info(ctx: &mut Ctx<'_>, event: &Event) -> Result<Transition, UiError> {
    let date = describe_date(ctx, event);
    ctx.prompt.show(&format!("Location:    {}", event.location));
    ctx.prompt.show(&format!("Date:        {date}"));
    if !event.description.is_empty() {
        ctx.prompt.show(&format!("Description: {}", event.description));
    }
    if !event.images.is_empty() {
        ctx.prompt.show(&format!("Images:      {}", event.images));
    }
    if let Some(ngo) = event.created_by.as_ref().and_then(Ref::full) {
        ctx.prompt.show(&format!("Organized by {}", ngo.name));
    }

    let menu = Menu::new()
        .item("Mark attendance", InfoAction::MarkAttendance)
        .item("Attendance records", InfoAction::Records);

    let event = event.clone();
    Ok(match menu.choose(ctx.prompt)? {
        Some(InfoAction::MarkAttendance) => Transition::Navigate(Route::SelectCollege { event }),
        Some(InfoAction::Records) => Transition::Navigate(Route::AttendanceRecords { event }),
        None => Transition::Back,
    })
}

pub async fn select_college(ctx: &mut Ctx<'_>, event: &Event) -> Result<Transition, UiError> {
    let colleges = match ctx.backend.colleges().await {
        Ok(colleges) => colleges,
        Err(err) => {
            ctx.report("Failed to load colleges", &err);
            return Ok(Transition::Back);
        }
    };
    if colleges.is_empty() {
        ctx.prompt.alert("No colleges", "No colleges are registered yet");
        return Ok(Transition::Back);
    }

    let mut menu = Menu::new();
    for college in colleges {
        menu.push(college.name.clone(), college);
    }

    Ok(match menu.choose(ctx.prompt)? {
        Some(college) => Transition::Navigate(Route::StudentsList {
            event: event.clone(),
            college,
        }),
        None => Transition::Back,
    })
}

/// Who is marked present while taking attendance.
#[derive(Debug, Default)]
pub struct AttendanceSheet {
    present: BTreeSet<String>,
    /// Only show the students of this class.
    class: Option<String>,
}

impl AttendanceSheet {
    pub fn toggle(&mut self, student_id: &str) {
        if !self.present.remove(student_id) {
            self.present.insert(student_id.to_string());
        }
    }

    pub fn is_present(&self, student_id: &str) -> bool {
        self.present.contains(student_id)
    }

    pub fn count(&self) -> usize {
        self.present.len()
    }

    pub fn shows(&self, class: &Class) -> bool {
        self.class.as_ref().map_or(true, |id| *id == class.id)
    }

    pub fn attendance(&self, event: &Event, college: &College) -> Attendance {
        Attendance {
            student_ids: self.present.iter().cloned().collect(),
            event_id: event.id.clone(),
            college_id: college.id.clone(),
        }
    }
}

enum SheetAction {
    Toggle(String),
    Filter(Option<String>),
    Submit,
}

pub async fn students_list(
    ctx: &mut Ctx<'_>,
    event: &Event,
    college: &College,
) -> Result<Transition, UiError> {
    let mut sheet = AttendanceSheet::default();

    loop {
        let mut menu = Menu::new();
        for (class, student) in college.students() {
            if !sheet.shows(class) {
                continue;
            }
            let mark = if sheet.is_present(&student.id) { "x" } else { " " };
            let label = format!("[{mark}] {} ({})", student.name, class.class_name);
            menu.push(label, SheetAction::Toggle(student.id.clone()));
        }
        if college.classes.len() > 1 {
            menu.push("Show all classes", SheetAction::Filter(None));
            for class in &college.classes {
                let label = format!("Show only {}", class.class_name);
                menu.push(label, SheetAction::Filter(Some(class.id.clone())));
            }
        }
        menu.push(
            format!("Submit attendance ({} present)", sheet.count()),
            SheetAction::Submit,
        );

        match menu.choose(ctx.prompt)? {
            Some(SheetAction::Toggle(id)) => sheet.toggle(&id),
            Some(SheetAction::Filter(class)) => sheet.class = class,
            Some(SheetAction::Submit) => {
                let attendance = sheet.attendance(event, college);
                match ctx.backend.submit_attendance(&attendance).await {
                    Ok(()) => {
                        info!(
                            "submitted attendance of {} students for {:?}",
                            attendance.student_ids.len(),
                            event.aim
                        );
                        ctx.prompt
                            .alert("Success", "Attendance has been submitted successfully!");
                        return Ok(Transition::Back);
                    }
                    Err(err) => ctx.report("Failed to submit attendance", &err),
                }
            }
            None => return Ok(Transition::Back),
        }
    }
}

pub async fn attendance_records(ctx: &mut Ctx<'_>, event: &Event) -> Result<Transition, UiError> {
    let report = match ctx.backend.event_attendance(&event.id).await {
        Ok(report) => report,
        Err(err) => {
            ctx.report("Failed to fetch attendance data", &err);
            return Ok(Transition::Back);
        }
    };

    ctx.prompt
        .show(&format!("Total students present: {}", report.total_present));
    if report.attendance.is_empty() {
        ctx.prompt.show("No attendance records found.");
    }
    for entry in &report.attendance {
        let class = match entry.class.as_ref() {
            Some(Ref::Full(class)) => class.class_name.as_str(),
            _ => "unknown class",
        };
        let marked = match &entry.attendance_marked_at {
            Some(time) => util::format_event_date(time, ctx.time_zone),
            None => "-".to_string(),
        };
        ctx.prompt.show(&format!(
            "{} ({}, {class}) at {marked}",
            entry.name, entry.department
        ));
    }

    form::pause(ctx.prompt)?;
    Ok(Transition::Back)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jiff::tz::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::api::testing::FakeBackend;
    use crate::api::{AttendanceEntry, AttendanceReport, Student};
    use crate::logger::Logger;
    use crate::session::testing::MemoryStore;
    use crate::session::SessionManager;
    use crate::ui::prompt::Script;

    fn student(id: &str, name: &str) -> Student {
        Student {
            id: id.to_string(),
            name: name.to_string(),
            ..Student::default()
        }
    }

    fn college() -> College {
        College {
            id: "c1".to_string(),
            name: "Beta College".to_string(),
            classes: vec![
                Class {
                    id: "k1".to_string(),
                    class_name: "FY".to_string(),
                    students: vec![student("s1", "Asha"), student("s2", "Ravi")],
                },
                Class {
                    id: "k2".to_string(),
                    class_name: "SY".to_string(),
                    students: vec![student("s3", "Meera")],
                },
            ],
            ..College::default()
        }
    }

    fn event() -> Event {
        Event {
            id: "e1".to_string(),
            aim: "Beach cleanup".to_string(),
            ..Event::default()
        }
    }

    #[test]
    fn toggling_twice_unmarks() {
        let mut sheet = AttendanceSheet::default();
        sheet.toggle("s2");
        sheet.toggle("s1");
        sheet.toggle("s3");
        sheet.toggle("s3");

        let attendance = sheet.attendance(&event(), &college());
        assert_eq!(attendance.student_ids, ["s1", "s2"]);
        assert_eq!(attendance.event_id, "e1");
        assert_eq!(attendance.college_id, "c1");
    }

    async fn session() -> SessionManager {
        SessionManager::hydrate(Arc::new(MemoryStore::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn attendance_is_taken_across_classes() {
        let session = session().await;
        let backend = FakeBackend::new();
        let logger = Logger::new();
        let time_zone = TimeZone::UTC;
        // Mark Asha and Meera, show only SY, unmark Meera again, submit.
        let mut prompt = Script::new(["1", "3", "6", "1", "5"]);
        let mut ctx = Ctx {
            session: &session,
            backend: &backend,
            prompt: &mut prompt,
            logger: &logger,
            time_zone: &time_zone,
        };

        let transition = students_list(&mut ctx, &event(), &college()).await.unwrap();

        assert_eq!(transition, Transition::Back);
        assert_eq!(
            backend.calls(),
            [(
                "submit_attendance".to_string(),
                json!({"studentIds": ["s1"], "eventId": "e1", "collegeId": "c1"})
            )]
        );
        assert_eq!(
            prompt.alerts,
            ["Success: Attendance has been submitted successfully!"]
        );
    }

    #[tokio::test]
    async fn events_are_added_with_a_timestamp() {
        let session = session().await;
        let backend = FakeBackend::new();
        let logger = Logger::new();
        let time_zone = TimeZone::UTC;
        let mut prompt = Script::new([
            "1",
            "Beach cleanup",
            "Juhu",
            "Collect plastic",
            "",
            "2026-03-01 09:00",
        ]);
        let mut ctx = Ctx {
            session: &session,
            backend: &backend,
            prompt: &mut prompt,
            logger: &logger,
            time_zone: &time_zone,
        };

        assert_eq!(
            events(&mut ctx, &Ngo::default()).await.unwrap(),
            Transition::Stay
        );

        let (name, body) = backend.calls().pop().unwrap();
        assert_eq!(name, "add_event");
        assert_eq!(
            body,
            json!({
                "location": "Juhu",
                "aim": "Beach cleanup",
                "description": "Collect plastic",
                "images": "",
                "eventDate": "2026-03-01T09:00:00Z",
            })
        );
    }

    #[tokio::test]
    async fn incomplete_events_are_not_sent() {
        let session = session().await;
        let backend = FakeBackend::new();
        let logger = Logger::new();
        let time_zone = TimeZone::UTC;
        let mut prompt = Script::new(["", "Juhu", "", "", "tomorrow"]);
        let mut ctx = Ctx {
            session: &session,
            backend: &backend,
            prompt: &mut prompt,
            logger: &logger,
            time_zone: &time_zone,
        };

        add_event(&mut ctx, &Ngo::default()).await.unwrap();

        assert!(backend.calls().is_empty());
        assert_eq!(prompt.alerts, ["Error: Please fill in aim, location and date"]);
    }

    #[tokio::test]
    async fn attendance_records_are_listed() {
        let session = session().await;
        let backend = FakeBackend::new().with_report(AttendanceReport {
            event: Some(event()),
            attendance: vec![AttendanceEntry {
                name: "Asha".to_string(),
                department: "CS".to_string(),
                class: Some(Ref::Full(Class {
                    class_name: "FY".to_string(),
                    ..Class::default()
                })),
                attendance_marked_at: Some("2026-03-01T10:00:00Z".to_string()),
            }],
            total_present: 1,
        });
        let logger = Logger::new();
        let time_zone = TimeZone::UTC;
        let mut prompt = Script::new([""]);
        let mut ctx = Ctx {
            session: &session,
            backend: &backend,
            prompt: &mut prompt,
            logger: &logger,
            time_zone: &time_zone,
        };

        attendance_records(&mut ctx, &event()).await.unwrap();

        assert!(prompt.saw("Total students present: 1"));
        assert!(prompt.saw("Asha (CS, FY) at 2026-03-01 10:00"));
        assert_eq!(backend.calls()[0], ("event_attendance".to_string(), json!("e1")));
    }
}
