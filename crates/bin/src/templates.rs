//! HTML templates for web interface
//!
//! Simple inline HTML templates without a template engine.

use devqueue::HubStats;

/// Common CSS styles for all pages
const COMMON_STYLES: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        max-width: 1000px;
        margin: 40px auto;
        padding: 0 20px;
        background: #f5f5f5;
    }
    .container {
        background: white;
        padding: 30px;
        border-radius: 8px;
        box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        margin-bottom: 20px;
    }
    h1 {
        color: #333;
        border-bottom: 2px solid #0066cc;
        padding-bottom: 10px;
    }
    h2 {
        color: #555;
        margin-top: 0;
    }
    .info-row {
        margin: 10px 0;
        padding: 8px;
        background: #f9f9f9;
        border-radius: 4px;
    }
    .label {
        font-weight: bold;
        color: #666;
        display: inline-block;
        width: 150px;
    }
    .value {
        color: #0066cc;
    }
    input[type="text"], select {
        padding: 8px;
        border: 1px solid #ddd;
        border-radius: 4px;
        font-size: 14px;
    }
    button {
        background: #0066cc;
        color: white;
        padding: 6px 14px;
        border: none;
        border-radius: 4px;
        cursor: pointer;
        margin: 2px;
    }
    button.secondary { background: #888; }
    button.danger { background: #cc3300; }
    table { border-collapse: collapse; width: 100%; margin: 15px 0; }
    th, td { text-align: left; padding: 8px; border-bottom: 1px solid #ddd; vertical-align: top; }
    th { background-color: #f0f0f0; }
    .free { color: #2a8a2a; font-weight: bold; }
    .held { color: #cc3300; font-weight: bold; }
    .banner {
        padding: 12px;
        background: #fff4d6;
        border: 1px solid #e0b84c;
        border-radius: 4px;
        margin-bottom: 20px;
    }
    .hidden { display: none; }
"#;

/// Client script for the index page.
///
/// Keeps a per-browser identity in localStorage (sent as `browser_id`), renders every
/// snapshot it receives and reconnects after a dropped connection.
const CLIENT_SCRIPT: &str = r#"
(function () {
    const browserId = localStorage.getItem('devqueue_browser_id') || crypto.randomUUID();
    localStorage.setItem('devqueue_browser_id', browserId);

    let socket = null;
    let state = { users: {}, devices: {} };
    let currentUser = localStorage.getItem('devqueue_user') || '';

    const el = (id) => document.getElementById(id);

    function send(action, payload) {
        if (socket && socket.readyState === WebSocket.OPEN) {
            socket.send(JSON.stringify({ action, payload }));
        }
    }

    function myUsers() {
        return Object.values(state.users).filter((u) => u.browser_id === browserId);
    }

    function userName(id) {
        const user = state.users[id];
        return user ? user.name : '?';
    }

    function button(label, cls, onClick) {
        const b = document.createElement('button');
        b.textContent = label;
        if (cls) b.className = cls;
        b.addEventListener('click', onClick);
        return b;
    }

    function renderUsers() {
        const select = el('current-user');
        const mine = myUsers();
        if (!mine.some((u) => u.id === currentUser)) {
            currentUser = mine.length ? mine[0].id : '';
        }
        localStorage.setItem('devqueue_user', currentUser);
        select.replaceChildren(...mine.map((u) => {
            const opt = document.createElement('option');
            opt.value = u.id;
            opt.textContent = u.name;
            opt.selected = u.id === currentUser;
            return opt;
        }));

        const list = el('user-list');
        list.replaceChildren(...mine.map((u) => {
            const li = document.createElement('li');
            li.textContent = u.name + ' ';
            li.appendChild(button('Delete', 'danger', () => {
                send('deleteUser', { id: u.id, browser_id: browserId });
            }));
            return li;
        }));
    }

    function renderDevices() {
        const rows = Object.values(state.devices).map((d) => {
            const tr = document.createElement('tr');

            const name = document.createElement('td');
            name.innerHTML = '<strong></strong><br><small></small>';
            name.querySelector('strong').textContent = d.name;
            name.querySelector('small').textContent = d.details;

            const status = document.createElement('td');
            if (d.in_use_by) {
                status.className = 'held';
                status.textContent = 'In use by ' + userName(d.in_use_by);
            } else {
                status.className = 'free';
                status.textContent = 'Free';
            }

            const queue = document.createElement('td');
            queue.textContent = d.queue.map(userName).join(', ');

            const actions = document.createElement('td');
            const me = currentUser;
            if (me) {
                const payload = { userId: me, deviceId: d.id };
                if (d.in_use_by === me) {
                    actions.appendChild(button('Release', '', () => send('releaseDevice', payload)));
                } else if (!d.in_use_by) {
                    actions.appendChild(button('Use', '', () => send('useDevice', payload)));
                } else {
                    if (d.queue.includes(me)) {
                        actions.appendChild(button('Leave queue', 'secondary', () => send('leaveQueue', payload)));
                    } else {
                        actions.appendChild(button('Queue', '', () => send('queueDevice', payload)));
                    }
                    actions.appendChild(button('Preempt', 'danger', () => send('preemptDevice', payload)));
                }
            }
            actions.appendChild(button('Edit', 'secondary', () => {
                const newName = prompt('Device name', d.name);
                if (newName === null) return;
                const newDetails = prompt('Device details', d.details);
                if (newDetails === null) return;
                send('editDevice', { id: d.id, name: newName, details: newDetails });
            }));
            actions.appendChild(button('Delete', 'danger', () => {
                if (confirm('Delete device ' + d.name + '?')) send('deleteDevice', { id: d.id });
            }));

            tr.append(name, status, queue, actions);
            return tr;
        });
        el('device-rows').replaceChildren(...rows);
    }

    function notify(notification) {
        if (!notification || notification.type !== 'device_available') return;
        if (!myUsers().some((u) => u.id === notification.user_id)) return;
        const text = userName(notification.user_id) + ', ' + notification.device_name + ' is now yours.';
        const banner = el('banner');
        banner.textContent = text;
        banner.classList.remove('hidden');
        if ('Notification' in window && Notification.permission === 'granted') {
            new Notification('Device available', { body: text });
        }
    }

    function connect() {
        const scheme = location.protocol === 'https:' ? 'wss' : 'ws';
        socket = new WebSocket(scheme + '://' + location.host + '/ws');
        socket.addEventListener('open', () => { el('connection').textContent = 'connected'; });
        socket.addEventListener('message', (event) => {
            state = JSON.parse(event.data);
            renderUsers();
            renderDevices();
            notify(state.notification);
        });
        socket.addEventListener('close', () => {
            el('connection').textContent = 'disconnected, retrying...';
            setTimeout(connect, 2000);
        });
    }

    el('add-user').addEventListener('submit', (event) => {
        event.preventDefault();
        const name = el('user-name').value.trim();
        if (name) send('addUser', { name, browser_id: browserId });
        el('user-name').value = '';
    });

    el('add-device').addEventListener('submit', (event) => {
        event.preventDefault();
        const name = el('device-name').value.trim();
        const details = el('device-details').value.trim();
        if (name) send('addDevice', { name, details });
        el('device-name').value = '';
        el('device-details').value = '';
    });

    el('current-user').addEventListener('change', (event) => {
        currentUser = event.target.value;
        localStorage.setItem('devqueue_user', currentUser);
        renderDevices();
    });

    el('banner').addEventListener('click', () => el('banner').classList.add('hidden'));

    if ('Notification' in window && Notification.permission === 'default') {
        Notification.requestPermission();
    }

    connect();
})();
"#;

/// Built-in single-page client served at `/`.
pub fn index_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>devqueue</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <h1>Shared Devices</h1>
    <div id="banner" class="banner hidden"></div>

    <div class="container">
        <h2>Who are you?</h2>
        <div><span class="label">Acting as:</span> <select id="current-user"></select>
            <small>(<span id="connection">connecting...</span>)</small></div>
        <ul id="user-list"></ul>
        <form id="add-user">
            <input type="text" id="user-name" placeholder="New user name">
            <button type="submit">Add user</button>
        </form>
    </div>

    <div class="container">
        <h2>Devices</h2>
        <table>
            <thead><tr><th>Device</th><th>Status</th><th>Queue</th><th>Actions</th></tr></thead>
            <tbody id="device-rows"></tbody>
        </table>
        <form id="add-device">
            <input type="text" id="device-name" placeholder="Device name">
            <input type="text" id="device-details" placeholder="Details (optional)">
            <button type="submit">Add device</button>
        </form>
    </div>

    <script>{CLIENT_SCRIPT}</script>
</body>
</html>"#
    )
}

/// Statistics page
pub fn stats_page(stats: &HubStats) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>devqueue Server Statistics</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
        <h1>devqueue Server Statistics</h1>
        <div class="info-row"><span class="label">Active Sessions:</span> <span class="value">{sessions}</span></div>
        <div class="info-row"><span class="label">Users:</span> <span class="value">{users}</span></div>
        <div class="info-row"><span class="label">Devices:</span> <span class="value">{devices}</span></div>
    </div>
</body>
</html>"#,
        sessions = stats.sessions,
        users = stats.users,
        devices = stats.devices,
    )
}
