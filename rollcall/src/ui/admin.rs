use log::info;

use super::form::{self, Menu};
use super::{Ctx, Transition, UiError};
use crate::api::{NewCollege, NewNgo};

enum Action {
    AddCollege,
    AddNgo,
    Logout,
}

pub async fn panel(ctx: &mut Ctx<'_>) -> Result<Transition, UiError> {
    match ctx.backend.colleges().await {
        Ok(colleges) => {
            ctx.prompt.show(&format!("Colleges ({}):", colleges.len()));
            for college in colleges {
                ctx.prompt
                    .show(&format!("  {} <{}>", college.name, college.email));
            }
        }
        Err(err) => ctx.report("Failed to load colleges", &err),
    }

    match ctx.backend.ngos().await {
        Ok(ngos) => {
            ctx.prompt.show(&format!("NGOs ({}):", ngos.len()));
            for ngo in ngos {
                ctx.prompt.show(&format!("  {} <{}>", ngo.name, ngo.email));
            }
        }
        Err(err) => ctx.report("Failed to load NGOs", &err),
    }

    let menu = Menu::new()
        .item("Add college", Action::AddCollege)
        .item("Add NGO", Action::AddNgo)
        .item("Logout", Action::Logout);

    Ok(match menu.choose(ctx.prompt)? {
        Some(Action::AddCollege) => {
            add_college(ctx).await?;
            Transition::Stay
        }
        Some(Action::AddNgo) => {
            add_ngo(ctx).await?;
            Transition::Stay
        }
        Some(Action::Logout) => ctx.logout().await,
        None => Transition::Back,
    })
}

async fn add_college(ctx: &mut Ctx<'_>) -> Result<(), UiError> {
    let Some([name, email, address, mobile]) =
        form::fields(ctx.prompt, ["Name", "Email", "Address", "Mobile"])?
    else {
        return Ok(());
    };
    let Some(password) = ctx.prompt.secret("Password")? else {
        return Ok(());
    };
    if name.is_empty() || email.is_empty() || password.is_empty() {
        ctx.prompt
            .alert("Error", "Please fill in name, email and password");
        return Ok(());
    }

    let college = NewCollege {
        name,
        email,
        address,
        password,
        mobile,
    };
    match ctx.backend.add_college(&college).await {
        Ok(()) => {
            info!("registered college {}", college.name);
            ctx.prompt.alert("Success", "College added successfully");
        }
        Err(err) => ctx.report("Failed to add college", &err),
    }
    Ok(())
}

async fn add_ngo(ctx: &mut Ctx<'_>) -> Result<(), UiError> {
    let labels = ["Name", "Email", "Address", "Mobile", "Registration number"];
    let Some([name, email, address, mobile, registration_number]) =
        form::fields(ctx.prompt, labels)?
    else {
        return Ok(());
    };
    let Some(password) = ctx.prompt.secret("Password")? else {
        return Ok(());
    };
    if name.is_empty() || email.is_empty() || password.is_empty() {
        ctx.prompt
            .alert("Error", "Please fill in name, email and password");
        return Ok(());
    }

    let ngo = NewNgo {
        name,
        email,
        address,
        password,
        mobile,
        registration_number,
    };
    match ctx.backend.add_ngo(&ngo).await {
        Ok(()) => {
            info!("registered NGO {}", ngo.name);
            ctx.prompt.alert("Success", "NGO added successfully");
        }
        Err(err) => ctx.report("Failed to add NGO", &err),
    }
    Ok(())
}
