//! The college workspace: classes and their students.

use log::{info, warn};

use super::form::{self, Menu};
use super::{Ctx, Transition, UiError};
use crate::api::{Class, College, NewClass, NewStudent, NewStudents, Ref, Student};
use crate::nav::Route;
use crate::util;

/// Fetch the latest version of a college, since its classes and students
/// are only ever delivered as part of the college list.
async fn refresh(ctx: &mut Ctx<'_>, college: &College) -> College {
    match ctx.backend.colleges().await {
        Ok(colleges) => colleges
            .into_iter()
            .find(|c| c.id == college.id)
            .unwrap_or_else(|| college.clone()),
        Err(err) => {
            warn!("failed to refresh {}: {err}", college.name);
            college.clone()
        }
    }
}

enum ClassesAction {
    Open(Class),
    Add,
    Logout,
}

pub async fn classes(ctx: &mut Ctx<'_>, college: &College) -> Result<Transition, UiError> {
    let college = refresh(ctx, college).await;

    let mut menu = Menu::new();
    if college.classes.is_empty() {
        ctx.prompt.show("No classes yet.");
    }
    for class in &college.classes {
        let label = format!("{} ({} students)", class.class_name, class.students.len());
        menu.push(label, ClassesAction::Open(class.clone()));
    }
    menu.push("Add class", ClassesAction::Add);
    menu.push("Logout", ClassesAction::Logout);

    Ok(match menu.choose(ctx.prompt)? {
        Some(ClassesAction::Open(class)) => {
            Transition::Navigate(Route::ClassStudents { college, class })
        }
        Some(ClassesAction::Add) => {
            add_class(ctx).await?;
            Transition::Stay
        }
        Some(ClassesAction::Logout) => ctx.logout().await,
        None => Transition::Back,
    })
}

async fn add_class(ctx: &mut Ctx<'_>) -> Result<(), UiError> {
    let Some(class_name) = form::field(ctx.prompt, "Class name")? else {
        return Ok(());
    };
    if class_name.is_empty() {
        ctx.prompt.alert("Error", "Please enter a class name");
        return Ok(());
    }

    match ctx.backend.add_class(&NewClass { class_name }).await {
        Ok(()) => ctx.prompt.alert("Success", "Class added successfully"),
        Err(err) => ctx.report("Failed to add class", &err),
    }
    Ok(())
}

enum StudentsAction {
    Open(Student),
    Add,
}

pub async fn class_students(
    ctx: &mut Ctx<'_>,
    college: &College,
    class: &Class,
) -> Result<Transition, UiError> {
    let college = refresh(ctx, college).await;
    let class = college
        .classes
        .iter()
        .find(|c| c.id == class.id)
        .unwrap_or(class);

    let mut menu = Menu::new();
    if class.students.is_empty() {
        ctx.prompt.show("No students in this class yet.");
    }
    for student in &class.students {
        let label = format!(
            "{} (PRN: {}, {})",
            student.name, student.prn, student.department
        );
        menu.push(label, StudentsAction::Open(student.clone()));
    }
    menu.push("Add students", StudentsAction::Add);

    Ok(match menu.choose(ctx.prompt)? {
        Some(StudentsAction::Open(student)) => {
            Transition::Navigate(Route::StudentEvents { student })
        }
        Some(StudentsAction::Add) => {
            add_students(ctx, class).await?;
            Transition::Stay
        }
        None => Transition::Back,
    })
}

async fn add_students(ctx: &mut Ctx<'_>, class: &Class) -> Result<(), UiError> {
    ctx.prompt
        .show("Enter one student at a time. Leave the name empty to finish.");

    let mut drafts = vec![];
    loop {
        let Some(name) = form::field(ctx.prompt, "Name")? else {
            return Ok(());
        };
        if name.is_empty() {
            break;
        }
        let Some([prn, department, email]) =
            form::fields(ctx.prompt, ["PRN", "Department", "Email"])?
        else {
            return Ok(());
        };
        drafts.push(NewStudent {
            name,
            department,
            email,
            prn,
        });
    }

    let batch = NewStudents::new(class.id.clone(), &drafts);
    if batch.students.is_empty() {
        ctx.prompt.alert("Error", "Please enter at least one student");
        return Ok(());
    }

    match ctx.backend.add_students(&batch).await {
        Ok(()) => {
            info!(
                "added {} students to {}",
                batch.students.len(),
                class.class_name
            );
            ctx.prompt.alert(
                "Success",
                &format!("Added {} students", batch.students.len()),
            );
        }
        Err(err) => ctx.report("Failed to add students", &err),
    }
    Ok(())
}

pub async fn student_events(ctx: &mut Ctx<'_>, student: &Student) -> Result<Transition, UiError> {
    ctx.prompt.show(&format!("PRN: {}", student.prn));
    if !student.email.is_empty() {
        ctx.prompt.show(&format!("Email: {}", student.email));
    }

    if student.attended_events.is_empty() {
        ctx.prompt.show("No events attended yet.");
    }
    for attended in &student.attended_events {
        let line = match attended.event.as_ref() {
            Some(Ref::Full(event)) => {
                let ngo = event
                    .created_by
                    .as_ref()
                    .and_then(Ref::full)
                    .map_or("N/A", |ngo| ngo.name.as_str());
                let date = event
                    .event_date
                    .as_deref()
                    .map_or_else(
                        || "N/A".to_string(),
                        |date| util::format_event_date(date, ctx.time_zone),
                    );
                format!("{} by {ngo} at {} on {date}", event.aim, event.location)
            }
            Some(Ref::Id(id)) => format!("event {id}"),
            None => "unknown event".to_string(),
        };
        ctx.prompt.show(&line);
    }

    form::pause(ctx.prompt)?;
    Ok(Transition::Back)
}
