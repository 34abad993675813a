use crate::session::Role;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Landing,
    Application,
    Dashboard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Disconnected,
    Landing,
    Application,
    UserDashboard,
    AdminDashboard,
}

pub fn route(session_present: bool, view: View, role: Option<Role>) -> Screen {
    if !session_present {
        return Screen::Disconnected;
    }
    match view {
        View::Landing => Screen::Landing,
        View::Application => Screen::Application,
        View::Dashboard => match role {
            Some(Role::Admin) => Screen::AdminDashboard,
            _ => Screen::UserDashboard,
        },
    }
}
